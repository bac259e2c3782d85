use crate::module::Module;
use std::fs;
use std::io;
use std::path::Path;

pub fn save_module(module: &Module, path: impl AsRef<Path>) -> io::Result<()> {
    let json = module_to_json(module).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    fs::write(path, json)?;
    Ok(())
}

pub fn load_module(path: impl AsRef<Path>) -> io::Result<Module> {
    let json = fs::read_to_string(path)?;
    serde_json::from_str(&json).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

pub fn module_to_json(module: &Module) -> serde_json::Result<String> {
    serde_json::to_string_pretty(module)
}
