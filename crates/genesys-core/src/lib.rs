pub mod calibration;
pub mod command_set;
pub mod consts;
pub mod device;
pub mod error;
pub mod frontend;
pub mod image;
pub mod interface;
pub mod model;
pub mod motor;
pub mod pipeline;
pub mod progress;
pub mod register;
pub mod registry;
pub mod sensor;
pub mod session;
pub mod settings;
pub mod utilities;
