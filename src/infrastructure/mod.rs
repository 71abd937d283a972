// Infrastructure layer - Configuration, hardware adapters and file export
pub mod calibration_store;
pub mod config;
pub mod report_writer;
pub mod simulated_driver;
