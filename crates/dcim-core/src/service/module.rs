//! Module operations

use super::{DcimService, Operation};
use crate::error::DcimError;
use crate::module::{ModuleInstallOptions, PopulationMode, PopulationReport, bay_position, clean_module_install, populate_module_components};
use crate::notify::{ChangeEvent, ObjectKind};
use crate::template_set::TemplateSet;
use dcim_models::*;
use tracing::info;

/// A saved module and what populating it did
#[derive(Debug, Clone)]
pub struct InstalledModule {
    pub module: Module,
    pub report: PopulationReport,
}

impl DcimService {
    /// Install a module in a bay and populate its components
    pub async fn create_module(&self, module: Module, options: ModuleInstallOptions) -> Result<InstalledModule, DcimError> {
        info!(
            "Installing module type {} in bay {} of device {}",
            module.module_type_id, module.module_bay_id, module.device_id
        );
        let op = self.begin().await?;
        let result = create_module_in_transaction(&op, module, options).await;
        self.finish(op, result).await
    }

    /// Remove a module with the components it owns
    pub async fn delete_module(&self, module_id: u64) -> Result<(), DcimError> {
        let op = self.begin().await?;
        let result: Result<(), DcimError> = async {
            let module = op.store().get_module(module_id).await?;
            info!("Removing module {} from device {}", module_id, module.device_id);
            op.store().delete_module(module_id).await?;
            op.notify(ChangeEvent::deleted(ObjectKind::Module, module_id).on_device(module.device_id));
            Ok(())
        }
        .await;
        self.finish(op, result).await
    }
}

async fn create_module_in_transaction(
    op: &Operation,
    module: Module,
    options: ModuleInstallOptions,
) -> Result<InstalledModule, DcimError> {
    let store = op.store();
    let templates = TemplateSet::load(store, TemplateOwner::ModuleType(module.module_type_id)).await?;
    clean_module_install(store, &module, &templates, options)
        .await?
        .into_result()?;

    let bay = store.get_component(module.module_bay_id).await?;
    let module = store.create_module(module).await?;
    if let Some(id) = module.id {
        op.notify(ChangeEvent::created(ObjectKind::Module, id).on_device(module.device_id));
    }

    let mode = PopulationMode::select(true, options.adopt_components, options.replicate_components);
    let report = populate_module_components(
        &op.instantiator(),
        store,
        op.observer(),
        &module,
        bay_position(&bay),
        &templates,
        mode,
    )
    .await?;
    Ok(InstalledModule { module, report })
}
