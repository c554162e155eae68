//! Module component population
//!
//! Installing a module either creates its components from the module type's
//! templates, adopts components of the same name that already exist on the
//! device without a module, or both. Which of these happens is a
//! [`PopulationMode`] chosen once per installation.

use crate::error::{DcimError, ErrorCategory, NON_FIELD_ERRORS, ValidationErrors};
use crate::instantiate::{Instantiator, NameIndex, Target};
use crate::notify::{ChangeEvent, ChangeObserver, ObjectKind};
use crate::template_set::TemplateSet;
use dcim_models::*;
use dcim_store::{ComponentFilter, DcimStore, ModuleScope};
use std::collections::HashMap;
use tracing::{debug, info};

/// What module installation does with the module type's templates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopulationMode {
    /// The module already existed; nothing is instantiated again
    NoOp,
    /// Create every templated component
    Replicate,
    /// Only take over existing module-less components of matching name
    Adopt,
    /// Take over matches, create the rest
    AdoptAndReplicate,
    /// Neither adopt nor replicate
    Disabled,
}

impl PopulationMode {
    pub fn select(is_new: bool, adopt: bool, replicate: bool) -> Self {
        if !is_new {
            return PopulationMode::NoOp;
        }
        match (adopt, replicate) {
            (false, true) => PopulationMode::Replicate,
            (true, false) => PopulationMode::Adopt,
            (true, true) => PopulationMode::AdoptAndReplicate,
            (false, false) => PopulationMode::Disabled,
        }
    }

    pub fn adopts(self) -> bool {
        matches!(self, PopulationMode::Adopt | PopulationMode::AdoptAndReplicate)
    }

    pub fn replicates(self) -> bool {
        matches!(self, PopulationMode::Replicate | PopulationMode::AdoptAndReplicate)
    }
}

/// Installation flags supplied with a new module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleInstallOptions {
    /// Create components from the module type's templates
    pub replicate_components: bool,
    /// Take over existing module-less components with matching names
    pub adopt_components: bool,
}

impl Default for ModuleInstallOptions {
    fn default() -> Self {
        Self {
            replicate_components: true,
            adopt_components: false,
        }
    }
}

/// Outcome of populating one module
#[derive(Debug, Clone, Default)]
pub struct PopulationReport {
    pub created: Vec<Component>,
    pub adopted: Vec<Component>,
    pub bridged: Vec<Component>,
}

/// Bay position used for `{module}`; an empty position counts as none
pub fn bay_position(bay: &Component) -> Option<String> {
    bay.as_module_bay()
        .map(|data| data.position.clone())
        .filter(|position| !position.is_empty())
}

/// Create and/or adopt the components of a freshly installed module
///
/// For each modular kind, in module order, existing module-less components
/// of the device are matched by name. Matches are adopted in one batch
/// update, the rest are created in one batch; observers hear about each
/// component after its batch returns. Interface bridges are resolved last.
pub async fn populate_module_components(
    instantiator: &Instantiator<'_>,
    store: &dyn DcimStore,
    observer: &dyn ChangeObserver,
    module: &Module,
    position: Option<String>,
    templates: &TemplateSet,
    mode: PopulationMode,
) -> Result<PopulationReport, DcimError> {
    let mut report = PopulationReport::default();
    if !mode.adopts() && !mode.replicates() {
        debug!("Module {:?} population mode {:?}, nothing to do", module.id, mode);
        return Ok(report);
    }
    let module_id = module
        .id
        .ok_or_else(|| DcimError::NotFound("Module has no id; save it before populating".to_string()))?;
    let target = Target::module(module.device_id, module_id, position);
    let mut names = NameIndex::new(module.device_id);

    for kind in ComponentKind::MODULAR {
        let mut orphans: HashMap<String, Component> = if mode.adopts() {
            store
                .query_components(
                    &ComponentFilter::of_device(module.device_id)
                        .kind(kind)
                        .module(ModuleScope::Unassigned),
                )
                .await?
                .into_iter()
                .map(|c| (c.name.clone(), c))
                .collect()
        } else {
            HashMap::new()
        };

        let mut to_create = Vec::new();
        let mut to_adopt = Vec::new();
        for template in templates.of_kind(kind) {
            let resolved = templates.resolve(template, target.position())?;
            for (index, name) in resolved.iter().enumerate() {
                if let Some(mut existing) = orphans.remove(&name.name) {
                    existing.module_id = Some(module_id);
                    to_adopt.push(existing);
                } else if mode.replicates() {
                    let component = instantiator
                        .build(templates, template, name, index, resolved.len(), &target, &mut names)
                        .await?;
                    to_create.push(component);
                }
            }
        }

        let created = instantiator.persist(to_create).await?;
        if !to_adopt.is_empty() {
            store.bulk_update_components(&to_adopt).await?;
            for component in &to_adopt {
                if let Some(id) = component.id {
                    observer.notify(
                        &ChangeEvent::updated(ObjectKind::Component(kind), id, &["module"]).on_device(component.device_id),
                    );
                }
            }
        }
        names.invalidate(kind);
        if !created.is_empty() || !to_adopt.is_empty() {
            info!(
                "Module {}: created {} and adopted {} {}",
                module_id,
                created.len(),
                to_adopt.len(),
                kind
            );
        }
        report.created.extend(created);
        report.adopted.extend(to_adopt);
    }

    report.bridged = instantiator.update_interface_bridges(templates, &target).await?;
    Ok(report)
}

/// The installed module's bay must belong to the module's device
pub async fn clean_module(store: &dyn DcimStore, module: &Module) -> Result<ValidationErrors, DcimError> {
    let mut errors = ValidationErrors::new();
    let bay = store.get_component(module.module_bay_id).await?;
    if bay.device_id != module.device_id || bay.as_module_bay().is_none() {
        let device = store.get_device(module.device_id).await?;
        errors.referential(
            "module_bay",
            format!(
                "Module must be installed within a module bay belonging to the assigned device ({}).",
                device.identifier()
            ),
        );
    }
    Ok(errors)
}

/// Checks run before a new module is saved
///
/// On top of [`clean_module`]: a module type using `{module}` needs a bay
/// position; without adoption, no resolved name may already exist on the
/// device; with adoption, a same-named component must not already belong to
/// another module.
pub async fn clean_module_install(
    store: &dyn DcimStore,
    module: &Module,
    templates: &TemplateSet,
    options: ModuleInstallOptions,
) -> Result<ValidationErrors, DcimError> {
    let mut errors = clean_module(store, module).await?;
    if !errors.is_empty() {
        return Ok(errors);
    }
    let bay = store.get_component(module.module_bay_id).await?;
    let position = bay_position(&bay);
    if position.is_none() && templates.needs_position() {
        errors.placement(
            "module_bay",
            "Cannot install module with placeholder values in a module bay with no position defined.",
        );
        return Ok(errors);
    }

    for kind in ComponentKind::MODULAR {
        let names = templates.resolved_names(kind, position.as_deref())?;
        if names.is_empty() {
            continue;
        }
        let existing: HashMap<String, Component> = store
            .query_components(&ComponentFilter::of_device(module.device_id).kind(kind))
            .await?
            .into_iter()
            .map(|c| (c.name.clone(), c))
            .collect();

        for name in &names {
            let Some(component) = existing.get(name) else {
                continue;
            };
            if options.adopt_components {
                if component.module_id.is_some() {
                    errors.add(
                        NON_FIELD_ERRORS,
                        ErrorCategory::Referential,
                        format!("Cannot adopt {} {} as it already belongs to a module", kind, name),
                    );
                }
            } else if options.replicate_components {
                errors.add(
                    NON_FIELD_ERRORS,
                    ErrorCategory::Referential,
                    format!(
                        "Cannot create {} {}: a component with that name already exists on this device",
                        kind, name
                    ),
                );
            }
        }
    }
    Ok(errors)
}
