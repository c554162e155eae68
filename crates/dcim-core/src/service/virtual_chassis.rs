//! Virtual chassis operations

use super::DcimService;
use crate::error::DcimError;
use crate::notify::{ChangeEvent, ObjectKind};
use crate::virtual_chassis::{check_virtual_chassis_delete, clean_virtual_chassis};
use dcim_models::VirtualChassis;
use tracing::info;

impl DcimService {
    pub async fn create_virtual_chassis(&self, virtual_chassis: VirtualChassis) -> Result<VirtualChassis, DcimError> {
        info!("Creating virtual chassis {}", virtual_chassis.name);
        let op = self.begin().await?;
        let result: Result<VirtualChassis, DcimError> = async {
            clean_virtual_chassis(op.store(), &virtual_chassis).await?.into_result()?;
            let created = op.store().create_virtual_chassis(virtual_chassis).await?;
            if let Some(id) = created.id {
                op.notify(ChangeEvent::created(ObjectKind::VirtualChassis, id));
            }
            Ok(created)
        }
        .await;
        self.finish(op, result).await
    }

    /// Save a chassis; a master must be one of its members
    pub async fn update_virtual_chassis(&self, virtual_chassis: VirtualChassis) -> Result<VirtualChassis, DcimError> {
        let vc_id = virtual_chassis
            .id
            .ok_or_else(|| DcimError::NotFound("Cannot update a virtual chassis without an id".to_string()))?;
        info!("Updating virtual chassis {}", virtual_chassis.name);
        let op = self.begin().await?;
        let result: Result<VirtualChassis, DcimError> = async {
            clean_virtual_chassis(op.store(), &virtual_chassis).await?.into_result()?;
            let saved = op.store().update_virtual_chassis(&virtual_chassis).await?;
            op.notify(ChangeEvent::updated(ObjectKind::VirtualChassis, vc_id, &[]));
            Ok(saved)
        }
        .await;
        self.finish(op, result).await
    }

    /// Delete a chassis unless members still form a cross-chassis LAG
    pub async fn delete_virtual_chassis(&self, vc_id: u64) -> Result<(), DcimError> {
        let op = self.begin().await?;
        let result: Result<(), DcimError> = async {
            let virtual_chassis = op.store().get_virtual_chassis(vc_id).await?;
            info!("Deleting virtual chassis {}", virtual_chassis.name);
            check_virtual_chassis_delete(op.store(), &virtual_chassis).await?;
            op.store().delete_virtual_chassis(vc_id).await?;
            op.notify(ChangeEvent::deleted(ObjectKind::VirtualChassis, vc_id));
            Ok(())
        }
        .await;
        self.finish(op, result).await
    }
}
