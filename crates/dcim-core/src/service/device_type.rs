//! Device type operations

use super::DcimService;
use crate::device_type::clean_device_type;
use crate::error::DcimError;
use crate::notify::{ChangeEvent, ObjectKind};
use dcim_models::DeviceType;
use tracing::info;

impl DcimService {
    /// Save a changed device type once every racked instance still fits
    pub async fn update_device_type(&self, device_type: DeviceType) -> Result<DeviceType, DcimError> {
        let type_id = device_type
            .id
            .ok_or_else(|| DcimError::NotFound("Cannot update a device type without an id".to_string()))?;
        info!("Updating device type {}", device_type.model);
        let op = self.begin().await?;
        let result: Result<DeviceType, DcimError> = async {
            let original = op.store().get_device_type(type_id).await?;
            clean_device_type(op.store(), Some(&original), &device_type)
                .await?
                .into_result()?;
            let saved = op.store().update_device_type(&device_type).await?;
            op.notify(ChangeEvent::updated(ObjectKind::DeviceType, type_id, &[]));
            Ok(saved)
        }
        .await;
        self.finish(op, result).await
    }
}
