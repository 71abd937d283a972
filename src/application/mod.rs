// Application layer - Servo control and fleet health use cases
pub mod health_monitor;
pub mod health_source;
pub mod servo_controller;
pub mod servo_driver;
