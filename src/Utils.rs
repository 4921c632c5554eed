/// sectioned task files: database path, reader settings, species lists and rate laws
pub mod task_loader;
