//! Template sets
//!
//! All component templates of one device type or module type, with the name
//! resolution needed to turn them into components.

use crate::error::DcimError;
use crate::naming::{expand_pattern, resolve_module_token};
use dcim_models::{ComponentKind, ComponentTemplate, TemplateOwner};
use dcim_store::DcimStore;

/// A concrete name (and label) produced from a template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedName {
    pub name: String,
    pub label: String,
}

/// Templates of one owner, in store order
#[derive(Debug, Clone)]
pub struct TemplateSet {
    owner: TemplateOwner,
    templates: Vec<ComponentTemplate>,
}

impl TemplateSet {
    pub fn new(owner: TemplateOwner, templates: Vec<ComponentTemplate>) -> Self {
        Self { owner, templates }
    }

    pub async fn load(store: &dyn DcimStore, owner: TemplateOwner) -> Result<Self, DcimError> {
        let templates = store.query_templates(owner, None).await?;
        Ok(Self::new(owner, templates))
    }

    pub fn owner(&self) -> TemplateOwner {
        self.owner
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ComponentTemplate> {
        self.templates.iter()
    }

    pub fn of_kind(&self, kind: ComponentKind) -> impl Iterator<Item = &ComponentTemplate> {
        self.templates.iter().filter(move |t| t.component_kind() == kind)
    }

    pub fn get(&self, id: u64) -> Option<&ComponentTemplate> {
        self.templates.iter().find(|t| t.id == id)
    }

    /// A template referenced by another template of this set
    pub fn referenced(&self, id: u64, kind: ComponentKind) -> Result<&ComponentTemplate, DcimError> {
        match self.get(id) {
            Some(template) if template.component_kind() == kind => Ok(template),
            Some(template) => Err(DcimError::InvalidTemplate(format!(
                "Template {} is a {}, expected a {}",
                template.name,
                template.component_kind(),
                kind
            ))),
            None => Err(DcimError::InvalidTemplate(format!(
                "Referenced {} template {} does not belong to the same type",
                kind, id
            ))),
        }
    }

    /// Whether any template name needs a module bay position
    pub fn needs_position(&self) -> bool {
        self.templates.iter().any(ComponentTemplate::has_module_token)
    }

    /// Names a template produces, with `{module}` replaced by `position`
    pub fn resolve(&self, template: &ComponentTemplate, position: Option<&str>) -> Result<Vec<ResolvedName>, DcimError> {
        let names = expand_pattern(&resolve_module_token(&template.name, position))?;
        let labels = if template.label.is_empty() {
            vec![String::new(); names.len()]
        } else {
            let labels = expand_pattern(&resolve_module_token(&template.label, position))?;
            if labels.len() == names.len() {
                labels
            } else if labels.len() == 1 {
                vec![labels[0].clone(); names.len()]
            } else {
                return Err(DcimError::InvalidTemplate(format!(
                    "Label pattern of {} yields {} values, but the name yields {}",
                    template.name,
                    labels.len(),
                    names.len()
                )));
            }
        };
        Ok(names
            .into_iter()
            .zip(labels)
            .map(|(name, label)| ResolvedName { name, label })
            .collect())
    }

    /// Every resolved name of one kind, in template order
    pub fn resolved_names(&self, kind: ComponentKind, position: Option<&str>) -> Result<Vec<String>, DcimError> {
        let mut names = Vec::new();
        for template in self.of_kind(kind) {
            names.extend(self.resolve(template, position)?.into_iter().map(|r| r.name));
        }
        Ok(names)
    }
}

/// The target name paired with source `index`
///
/// A template expanding to as many names as the template it points at maps
/// one to one; otherwise every name points at the first target.
pub fn paired<'a>(targets: &'a [ResolvedName], source_count: usize, index: usize) -> Option<&'a ResolvedName> {
    if targets.len() == source_count {
        targets.get(index)
    } else {
        targets.first()
    }
}
