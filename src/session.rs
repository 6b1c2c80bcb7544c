//! Labelling Session
//!
//! Owns the record for one operator session and exposes the two trigger
//! actions: regenerate the identifier, and export the mounted label.

use chrono::{DateTime, Local};
use tracing::{debug, info, warn};

use crate::config::LabelConfig;
use crate::identifier::hu_number;
use crate::layout::{render, LabelLayout};
use crate::payload::qr_payload;
use crate::pipeline::{ExportPipeline, ExportedDocument, ExportError};
use crate::policy::{FieldError, FieldPolicy};
use crate::raster::Rasterizer;
use crate::record::{FieldName, LabelRecord};
use crate::templates::{LabelSize, LabelType};

pub struct LabelSession {
    record: LabelRecord,
    policy: FieldPolicy,
    size: LabelSize,
    label_type: LabelType,
    mounted: Option<LabelLayout>,
}

impl LabelSession {
    /// The one initialisation point of a session.
    pub fn start(config: &LabelConfig, now: DateTime<Local>) -> Self {
        let record = LabelRecord::initial(config, now);
        info!(
            "Session started: date code {}, HU {}",
            record.date_code, record.hu_number
        );
        Self {
            record,
            policy: FieldPolicy::standard(),
            size: LabelSize::default(),
            label_type: config.label_type,
            mounted: None,
        }
    }

    pub fn with_policy(mut self, policy: FieldPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn record(&self) -> &LabelRecord {
        &self.record
    }

    pub fn size(&self) -> LabelSize {
        self.size
    }

    pub fn label_type(&self) -> LabelType {
        self.label_type
    }

    /// Data-entry boundary. Read-only fields are refused.
    pub fn set_field(&mut self, name: &str, value: impl Into<String>) -> Result<(), FieldError> {
        let field: FieldName = name.parse()?;
        self.policy.check(field)?;
        self.record.set(field, value);
        self.remount();
        Ok(())
    }

    /// Overlays every non-empty editable field of `other` onto the record.
    /// Read-only fields keep their session values. Used when a record is
    /// loaded from a file.
    pub fn merge_record(&mut self, other: &LabelRecord) {
        for field in FieldName::ALL {
            let value = other.get(*field);
            if value.is_empty() {
                continue;
            }
            if let Err(e) = self.policy.check(*field) {
                warn!("Ignoring merged value {:?}: {}", value, e);
                continue;
            }
            self.record.set(*field, value);
        }
        self.remount();
    }

    /// "Refresh HU": new identifier from the current date code and `now`.
    pub fn refresh_hu(&mut self, now: DateTime<Local>) -> &str {
        self.record.hu_number = hu_number(&self.record.date_code, now.time());
        self.remount();
        debug!("HU refreshed to {}", self.record.hu_number);
        &self.record.hu_number
    }

    pub fn select_size(&mut self, size: LabelSize) {
        if self.size != size {
            self.size = size;
            self.remount();
        }
    }

    pub fn set_label_type(&mut self, label_type: LabelType) {
        if self.label_type != label_type {
            self.label_type = label_type;
            self.remount();
        }
    }

    pub fn payload(&self) -> String {
        qr_payload(&self.record)
    }

    /// Renders the current record at the selected size and keeps it mounted.
    pub fn mount(&mut self) -> &LabelLayout {
        self.mounted
            .insert(render(&self.record, self.size, self.label_type))
    }

    /// Re-renders a mounted layout after an edit. A session that never
    /// mounted stays unmounted.
    fn remount(&mut self) {
        if self.mounted.is_some() {
            self.mounted = Some(render(&self.record, self.size, self.label_type));
        }
    }

    pub fn layout(&self) -> Option<&LabelLayout> {
        self.mounted.as_ref()
    }

    /// "Export": hands the mounted layout, if any, to the pipeline.
    pub async fn export<R: Rasterizer>(
        &self,
        pipeline: &ExportPipeline<R>,
    ) -> Result<ExportedDocument, ExportError> {
        pipeline
            .export(self.mounted.as_ref(), &self.record.hu_number)
            .await
    }
}
