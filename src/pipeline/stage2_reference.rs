use anyhow::Result;
use tracing::info;

use crate::ctx::Ctx;
use crate::materials::MaterialCatalog;
use crate::pipeline::Stage;
use crate::reference::ReferenceLibrary;

pub struct Stage2Reference;

impl Stage2Reference {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage2Reference {
    fn name(&self) -> &'static str {
        "stage2_reference"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let library = ReferenceLibrary::with_overlay(ctx.reference_path.as_deref())?;
        let catalog = MaterialCatalog::with_overlay(ctx.materials_path.as_deref())?;
        info!(
            version = %library.version,
            tables = library.tables.len(),
            materials = catalog.materials.len(),
            "reference_ready"
        );
        ctx.library = Some(library);
        ctx.catalog = Some(catalog);
        Ok(())
    }
}
