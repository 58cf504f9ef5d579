// Declarative commands over the config file
pub mod declarative;

// Single-application commands
pub mod resource;
