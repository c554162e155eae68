//! Component instantiation
//!
//! Turns the templates of a device type (or a module type) into concrete
//! components on one device. Each kind is written in one batch and every
//! created component is announced to the observer after the batch returns.
//! Inventory items nest, so they are created one at a time, parents first.
//!
//! Templates refer to each other by template id (an outlet's power port, a
//! front port's rear port, an interface's bridge, an inventory item's parent
//! and attached component). Those references are resolved by name against
//! the components already created on the device.

use crate::error::DcimError;
use crate::notify::{ChangeEvent, ChangeObserver, ObjectKind};
use crate::template_set::{ResolvedName, TemplateSet, paired};
use dcim_models::*;
use dcim_store::{ComponentFilter, DcimStore};
use std::collections::HashMap;
use tracing::{debug, info};

/// Where instantiated components go
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub device_id: u64,
    pub module: Option<ModuleSlot>,
}

/// The module that owns instantiated components, and its bay position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleSlot {
    pub module_id: u64,
    /// `None` when the bay has no position
    pub position: Option<String>,
}

impl Target {
    pub fn device(device_id: u64) -> Self {
        Self { device_id, module: None }
    }

    pub fn module(device_id: u64, module_id: u64, position: Option<String>) -> Self {
        Self {
            device_id,
            module: Some(ModuleSlot { module_id, position }),
        }
    }

    pub fn module_id(&self) -> Option<u64> {
        self.module.as_ref().map(|m| m.module_id)
    }

    pub fn position(&self) -> Option<&str> {
        self.module.as_ref().and_then(|m| m.position.as_deref())
    }
}

/// Component ids of one device by kind and name, loaded on first use
#[derive(Debug)]
pub(crate) struct NameIndex {
    device_id: u64,
    by_kind: HashMap<ComponentKind, HashMap<String, u64>>,
}

impl NameIndex {
    pub(crate) fn new(device_id: u64) -> Self {
        Self {
            device_id,
            by_kind: HashMap::new(),
        }
    }

    pub(crate) async fn lookup(
        &mut self,
        store: &dyn DcimStore,
        kind: ComponentKind,
        name: &str,
    ) -> Result<Option<u64>, DcimError> {
        if !self.by_kind.contains_key(&kind) {
            let components = store
                .query_components(&ComponentFilter::of_device(self.device_id).kind(kind))
                .await?;
            let names = components
                .into_iter()
                .filter_map(|c| c.id.map(|id| (c.name, id)))
                .collect();
            self.by_kind.insert(kind, names);
        }
        Ok(self.by_kind.get(&kind).and_then(|names| names.get(name)).copied())
    }

    /// Forget a kind after components of it were written
    pub(crate) fn invalidate(&mut self, kind: ComponentKind) {
        self.by_kind.remove(&kind);
    }
}

/// Creates components from templates and announces them
pub struct Instantiator<'a> {
    store: &'a dyn DcimStore,
    observer: &'a dyn ChangeObserver,
    bulk: bool,
}

impl<'a> Instantiator<'a> {
    /// `bulk == false` writes one component per store call
    pub fn new(store: &'a dyn DcimStore, observer: &'a dyn ChangeObserver, bulk: bool) -> Self {
        Self { store, observer, bulk }
    }

    /// Instantiate every template of a device type, in device order, then
    /// point interfaces at their bridges
    pub async fn instantiate_device(&self, templates: &TemplateSet, device_id: u64) -> Result<Vec<Component>, DcimError> {
        let target = Target::device(device_id);
        let mut names = NameIndex::new(device_id);
        let mut created = Vec::new();
        for kind in ComponentKind::DEVICE_ORDER {
            let components = if kind == ComponentKind::InventoryItem {
                self.instantiate_inventory(templates, &target, &mut names).await?
            } else {
                self.instantiate_kind(templates, kind, &target, &mut names).await?
            };
            created.extend(components);
        }
        self.update_interface_bridges(templates, &target).await?;
        info!("Instantiated {} components for device {}", created.len(), device_id);
        Ok(created)
    }

    /// Create all components of one (non-inventory) kind
    pub(crate) async fn instantiate_kind(
        &self,
        templates: &TemplateSet,
        kind: ComponentKind,
        target: &Target,
        names: &mut NameIndex,
    ) -> Result<Vec<Component>, DcimError> {
        let mut pending = Vec::new();
        for template in templates.of_kind(kind) {
            let resolved = templates.resolve(template, target.position())?;
            for (index, name) in resolved.iter().enumerate() {
                pending.push(self.build(templates, template, name, index, resolved.len(), target, names).await?);
            }
        }
        let created = self.persist(pending).await?;
        names.invalidate(kind);
        if !created.is_empty() {
            info!("Instantiated {} {} for device {}", created.len(), kind, target.device_id);
        }
        Ok(created)
    }

    /// One unsaved component for the `index`-th name of a template
    #[allow(clippy::too_many_arguments)]
    pub(crate) async fn build(
        &self,
        templates: &TemplateSet,
        template: &ComponentTemplate,
        resolved: &ResolvedName,
        index: usize,
        count: usize,
        target: &Target,
        names: &mut NameIndex,
    ) -> Result<Component, DcimError> {
        let data = match &template.kind {
            TemplateKind::ConsolePort(data) => ComponentData::ConsolePort(data.clone()),
            TemplateKind::ConsoleServerPort(data) => ComponentData::ConsoleServerPort(data.clone()),
            TemplateKind::PowerPort(data) => ComponentData::PowerPort(data.clone()),
            TemplateKind::PowerOutlet(data) => {
                let power_port_id = match data.power_port_template_id {
                    Some(template_id) => Some(
                        self.resolve_reference(templates, template_id, ComponentKind::PowerPort, index, count, target, names)
                            .await?,
                    ),
                    None => None,
                };
                ComponentData::PowerOutlet(PowerOutletData {
                    outlet_type: data.outlet_type.clone(),
                    power_port_id,
                    feed_leg: data.feed_leg,
                })
            }
            TemplateKind::Interface(data) => ComponentData::Interface(InterfaceData {
                iface_type: data.iface_type.clone(),
                mgmt_only: data.mgmt_only,
                enabled: data.enabled,
                ..InterfaceData::default()
            }),
            TemplateKind::FrontPort(data) => {
                let rear_port_id = self
                    .resolve_reference(templates, data.rear_port_template_id, ComponentKind::RearPort, index, count, target, names)
                    .await?;
                ComponentData::FrontPort(FrontPortData {
                    port_type: data.port_type.clone(),
                    rear_port_id,
                    rear_port_position: data.rear_port_position,
                })
            }
            TemplateKind::RearPort(data) => ComponentData::RearPort(data.clone()),
            TemplateKind::ModuleBay(data) => ComponentData::ModuleBay(data.clone()),
            TemplateKind::DeviceBay => ComponentData::DeviceBay(DeviceBayData::default()),
            TemplateKind::InventoryItem(data) => ComponentData::InventoryItem(InventoryItemData {
                manufacturer_id: data.manufacturer_id,
                part_id: data.part_id.clone(),
                ..InventoryItemData::default()
            }),
        };
        Ok(Component {
            id: None,
            device_id: target.device_id,
            module_id: target.module_id(),
            name: resolved.name.clone(),
            label: resolved.label.clone(),
            description: template.description.clone(),
            data,
        })
    }

    /// Id of the component created from another template of the set
    #[allow(clippy::too_many_arguments)]
    async fn resolve_reference(
        &self,
        templates: &TemplateSet,
        template_id: u64,
        kind: ComponentKind,
        index: usize,
        count: usize,
        target: &Target,
        names: &mut NameIndex,
    ) -> Result<u64, DcimError> {
        let referenced = templates.referenced(template_id, kind)?;
        let targets = templates.resolve(referenced, target.position())?;
        let name = paired(&targets, count, index)
            .map(|r| r.name.as_str())
            .ok_or_else(|| DcimError::InvalidTemplate(format!("Template {} resolves to no names", referenced.name)))?;
        names.lookup(self.store, kind, name).await?.ok_or_else(|| {
            DcimError::InvalidTemplate(format!(
                "{} {} not found on device {}",
                kind, name, target.device_id
            ))
        })
    }

    /// Write components and announce each one after its write returns
    pub(crate) async fn persist(&self, components: Vec<Component>) -> Result<Vec<Component>, DcimError> {
        if components.is_empty() {
            return Ok(components);
        }
        if self.bulk {
            let created = self.store.bulk_create_components(components).await?;
            for component in &created {
                self.announce_created(component);
            }
            return Ok(created);
        }
        let mut created = Vec::with_capacity(components.len());
        for component in components {
            let saved = self.store.create_component(component).await?;
            self.announce_created(&saved);
            created.push(saved);
        }
        Ok(created)
    }

    pub(crate) fn announce_created(&self, component: &Component) {
        if let Some(id) = component.id {
            self.observer
                .notify(&ChangeEvent::created(ObjectKind::Component(component.kind()), id).on_device(component.device_id));
        }
    }

    /// Create inventory items parents first, one store call per item
    pub(crate) async fn instantiate_inventory(
        &self,
        templates: &TemplateSet,
        target: &Target,
        names: &mut NameIndex,
    ) -> Result<Vec<Component>, DcimError> {
        let plan = InventoryPlan::new(templates)?;
        let mut created_ids: HashMap<u64, Vec<u64>> = HashMap::new();
        let mut created = Vec::new();

        for template in plan.ordered() {
            let TemplateKind::InventoryItem(data) = &template.kind else {
                continue;
            };
            let resolved = templates.resolve(template, target.position())?;
            let count = resolved.len();
            let mut ids = Vec::with_capacity(count);
            for (index, name) in resolved.iter().enumerate() {
                let mut component = self.build(templates, template, name, index, count, target, names).await?;
                if let ComponentData::InventoryItem(item) = &mut component.data {
                    item.parent_id = match data.parent_template_id {
                        Some(parent) => {
                            let parents = created_ids.get(&parent).map(Vec::as_slice).unwrap_or_default();
                            pick(parents, count, index)
                        }
                        None => None,
                    };
                    item.component = match data.component {
                        Some(reference) => self.attached_component(templates, reference, index, count, target, names).await?,
                        None => None,
                    };
                }
                let saved = self.store.create_component(component).await?;
                self.announce_created(&saved);
                if let Some(id) = saved.id {
                    ids.push(id);
                }
                created.push(saved);
            }
            created_ids.insert(template.id, ids);
        }
        if !created.is_empty() {
            info!("Instantiated {} inventory items for device {}", created.len(), target.device_id);
        }
        Ok(created)
    }

    async fn attached_component(
        &self,
        templates: &TemplateSet,
        reference: ComponentRef,
        index: usize,
        count: usize,
        target: &Target,
        names: &mut NameIndex,
    ) -> Result<Option<ComponentRef>, DcimError> {
        let kind = reference.kind();
        let id = self
            .resolve_reference(templates, reference.id(), kind, index, count, target, names)
            .await?;
        Ok(ComponentRef::new(kind, id))
    }

    /// Point each interface created from a template with a bridge template at
    /// the bridge interface of the same device
    ///
    /// Interfaces missing from the device (a module adopting only some of its
    /// interfaces) are skipped.
    pub async fn update_interface_bridges(&self, templates: &TemplateSet, target: &Target) -> Result<Vec<Component>, DcimError> {
        let interfaces = self
            .store
            .query_components(&ComponentFilter::of_device(target.device_id).kind(ComponentKind::Interface))
            .await?;
        let by_name: HashMap<&str, &Component> = interfaces.iter().map(|c| (c.name.as_str(), c)).collect();

        let mut updated = Vec::new();
        for template in templates.of_kind(ComponentKind::Interface) {
            let TemplateKind::Interface(InterfaceTemplateData {
                bridge_template_id: Some(bridge_template_id),
                ..
            }) = &template.kind
            else {
                continue;
            };
            let bridge_template = templates.referenced(*bridge_template_id, ComponentKind::Interface)?;
            let sources = templates.resolve(template, target.position())?;
            let bridges = templates.resolve(bridge_template, target.position())?;

            for (index, source) in sources.iter().enumerate() {
                let Some(bridge) = paired(&bridges, sources.len(), index) else {
                    continue;
                };
                let (Some(interface), Some(bridge_id)) = (
                    by_name.get(source.name.as_str()),
                    by_name.get(bridge.name.as_str()).and_then(|b| b.id),
                ) else {
                    debug!("Skipping bridge {} -> {}: interface not on device {}", source.name, bridge.name, target.device_id);
                    continue;
                };
                let mut interface = (*interface).clone();
                let Some(data) = interface.as_interface_mut() else {
                    continue;
                };
                data.bridge_id = Some(bridge_id);
                let saved = self.store.update_component(&interface).await?;
                if let Some(id) = saved.id {
                    self.observer.notify(
                        &ChangeEvent::updated(ObjectKind::Component(ComponentKind::Interface), id, &["bridge"])
                            .on_device(saved.device_id),
                    );
                }
                updated.push(saved);
            }
        }
        Ok(updated)
    }
}

/// The created id paired with the `index`-th of `count` names
fn pick(ids: &[u64], count: usize, index: usize) -> Option<u64> {
    if ids.len() == count {
        ids.get(index).copied()
    } else {
        ids.first().copied()
    }
}

/// Inventory item templates in parent-before-child order
///
/// Templates are kept in an arena and addressed by index; each node records
/// the index of its parent. Ordering is a depth-first walk that rejects
/// cycles and parents outside the set.
#[derive(Debug)]
pub struct InventoryPlan<'t> {
    nodes: Vec<&'t ComponentTemplate>,
    order: Vec<usize>,
}

impl<'t> InventoryPlan<'t> {
    pub fn new(templates: &'t TemplateSet) -> Result<Self, DcimError> {
        let nodes: Vec<&ComponentTemplate> = templates.of_kind(ComponentKind::InventoryItem).collect();
        let index_of: HashMap<u64, usize> = nodes.iter().enumerate().map(|(i, t)| (t.id, i)).collect();

        let mut parents: Vec<Option<usize>> = Vec::with_capacity(nodes.len());
        for template in &nodes {
            let parent = match &template.kind {
                TemplateKind::InventoryItem(InventoryItemTemplateData {
                    parent_template_id: Some(parent),
                    ..
                }) => Some(*index_of.get(parent).ok_or_else(|| {
                    DcimError::InvalidTemplate(format!(
                        "Inventory item {} has a parent template ({}) outside its type",
                        template.name, parent
                    ))
                })?),
                _ => None,
            };
            parents.push(parent);
        }

        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            New,
            Visiting,
            Done,
        }
        let mut marks = vec![Mark::New; nodes.len()];
        let mut order = Vec::with_capacity(nodes.len());
        for start in 0..nodes.len() {
            // Walk up to the first placed ancestor, then place the chain top-down
            let mut chain = Vec::new();
            let mut current = Some(start);
            while let Some(node) = current {
                match marks[node] {
                    Mark::Done => break,
                    Mark::Visiting => {
                        return Err(DcimError::InvalidTemplate(format!(
                            "Inventory item templates form a cycle through {}",
                            nodes[node].name
                        )));
                    }
                    Mark::New => {
                        marks[node] = Mark::Visiting;
                        chain.push(node);
                        current = parents[node];
                    }
                }
            }
            for node in chain.into_iter().rev() {
                marks[node] = Mark::Done;
                order.push(node);
            }
        }
        Ok(Self { nodes, order })
    }

    /// Templates in creation order
    pub fn ordered(&self) -> impl Iterator<Item = &'t ComponentTemplate> + '_ {
        self.order.iter().map(|i| self.nodes[*i])
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
