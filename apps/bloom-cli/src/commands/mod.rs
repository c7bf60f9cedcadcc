// Subcommand implementations for the bloom CLI.

pub mod goal;
