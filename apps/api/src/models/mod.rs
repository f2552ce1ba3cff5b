pub mod application;
pub mod intent;
pub mod packet;
