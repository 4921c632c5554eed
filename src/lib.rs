#[allow(non_snake_case)]
pub mod Geochemistry;
#[allow(non_snake_case)]
pub mod Utils;
pub mod settings;
