pub mod config_file;
pub mod outcome_report;
