// Clients module - calls to other services

pub mod menu_client;

pub use menu_client::{decode_dish_snapshot, HttpMenuClient, MenuClient};
