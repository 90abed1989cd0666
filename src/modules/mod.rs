pub mod accounts;
pub mod books;
pub mod pages;

use bookstore_kernel::ModuleRegistry;

use crate::state::AppState;

/// Register all project-specific modules with the registry
pub fn register_all(registry: &mut ModuleRegistry, state: &AppState) -> anyhow::Result<()> {
    registry.register(pages::create_module())?;
    registry.register(accounts::create_module(state.clone()))?;
    registry.register(books::create_module(state.clone()))?;
    Ok(())
}
