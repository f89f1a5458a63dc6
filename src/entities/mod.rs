// ABOUTME: SeaORM entities module for the inventory data model
// ABOUTME: Exports users, tokens, images, items, containers, mappings, history records and labels

pub mod auth_token;
pub mod container;
pub mod container_image;
pub mod container_record;
pub mod image;
pub mod image_metadata;
pub mod item;
pub mod item_image;
pub mod item_record;
pub mod label;
pub mod user;
