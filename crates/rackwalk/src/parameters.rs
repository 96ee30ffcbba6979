//! Parameter extraction for a single device.

use tracing::{debug, warn};

use crate::normalize::{is_corrupted, UNNAMED};
use crate::{
    AccessorError, ContainerKind, ExtractionContext, LiveAccessor, LomPath, LomValue,
    ParameterRecord,
};

/// Raw reads for one parameter, already unwrapped.
struct RawParameter {
    name: LomValue,
    value: LomValue,
    display_value: LomValue,
    default_value: LomValue,
    min: LomValue,
    max: LomValue,
    is_quantized: LomValue,
}

impl RawParameter {
    fn read<A: LiveAccessor + ?Sized>(accessor: &A, path: &LomPath) -> Result<Self, AccessorError> {
        let get = |name: &str| -> Result<LomValue, AccessorError> {
            Ok(accessor.get_property(path, name)?.unwrap_single())
        };

        Ok(Self {
            name: get("name")?,
            value: get("value")?,
            display_value: get("display_value")?,
            default_value: get("default_value")?,
            min: get("min")?,
            max: get("max")?,
            is_quantized: get("is_quantized")?,
        })
    }

    /// Returns the usable name, or `None` if the parameter must be dropped.
    fn qualified_name(&self) -> Option<String> {
        if is_corrupted(&self.name) || is_corrupted(&self.value) {
            return None;
        }
        self.name.as_text().filter(|name| name != UNNAMED)
    }
}

/// Null out corrupted optional fields. `parameter_id`, `name` and `value`
/// are never touched.
pub fn clean_parameter(mut record: ParameterRecord) -> ParameterRecord {
    for field in [
        &mut record.display_value,
        &mut record.default_value,
        &mut record.min,
        &mut record.max,
        &mut record.is_quantized,
    ] {
        if is_corrupted(field) {
            *field = LomValue::Null;
        }
    }
    record
}

/// Read every parameter of the object at `device_path`.
///
/// Parameters with a corrupted or missing name, or a corrupted value, are
/// left out. A read failure on one index is logged and skipped. Only a
/// failure to count the parameters, or a fatal accessor error, is returned.
pub fn extract_parameters<A: LiveAccessor + ?Sized>(
    accessor: &A,
    ctx: &mut ExtractionContext,
    device_path: &LomPath,
) -> Result<Vec<ParameterRecord>, AccessorError> {
    let count = accessor.child_count(device_path, ContainerKind::Parameters)?;
    debug!(path = %device_path, count, "extracting parameters");

    let mut handle = ctx.handles().acquire();
    let mut parameters = Vec::with_capacity(count);

    for index in 0..count {
        handle.target_child(device_path, ContainerKind::Parameters, index);

        let raw = match RawParameter::read(accessor, handle.path()) {
            Ok(raw) => raw,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!(path = %handle.path(), index, error = %e, "parameter read failed, skipping");
                ctx.skipped_parameters += 1;
                continue;
            }
        };

        let Some(name) = raw.qualified_name() else {
            debug!(
                path = %handle.path(),
                index,
                name = %raw.name,
                value = %raw.value,
                "skipping corrupted parameter"
            );
            ctx.skipped_parameters += 1;
            continue;
        };

        parameters.push(clean_parameter(ParameterRecord {
            parameter_id: index,
            name,
            value: raw.value,
            display_value: raw.display_value,
            default_value: raw.default_value,
            min: raw.min,
            max: raw.max,
            is_quantized: raw.is_quantized,
        }));
    }

    debug!(path = %device_path, kept = parameters.len(), "parameters extracted");
    Ok(parameters)
}
