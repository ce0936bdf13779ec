pub mod convert_wizard;
pub mod opportunity;
pub mod party;
