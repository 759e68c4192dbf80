pub mod client;
pub mod pushbullet;
