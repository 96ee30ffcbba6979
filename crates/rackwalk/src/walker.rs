//! Depth-first discovery of rack → chain → device trees.
//!
//! Depth counts container nesting: the root device is 0, its chains 1,
//! their devices 2, a nested rack's chains 3, and so on. Every edge adds
//! exactly one.

use tracing::{debug, warn};

use crate::normalize::{name_or_fallback, normalize};
use crate::parameters::extract_parameters;
use crate::{
    AccessorError, ChainEntry, ChainRecord, CircularMarker, ContainerKind, DepthMarker,
    DeviceEntry, DeviceRecord, ErrorMarker, ExtractError, ExtractionContext, LiveAccessor,
    LomPath, LomValue, NodeType, RootDevice,
};

pub struct TreeWalker<'a, A: LiveAccessor + ?Sized> {
    accessor: &'a A,
    ctx: &'a mut ExtractionContext,
}

impl<'a, A: LiveAccessor + ?Sized> TreeWalker<'a, A> {
    pub fn new(accessor: &'a A, ctx: &'a mut ExtractionContext) -> Self {
        Self { accessor, ctx }
    }

    /// Walk the device at `path` as the root of an extraction.
    ///
    /// Any failure to resolve the root itself is fatal. Failures below the
    /// root are recorded inline and do not stop the walk.
    pub fn walk_root(&mut self, path: &LomPath) -> Result<RootDevice, ExtractError> {
        let mut handle = self.ctx.handles().acquire();
        handle.target(path);

        let resolved = self
            .accessor
            .resolve(path)
            .map_err(|e| root_error(path, e))?;
        if !resolved.exists {
            return Err(ExtractError::RootUnresolvable {
                path: path.to_string(),
                reason: "no object at path".to_string(),
            });
        }
        handle.bind(resolved.id);
        self.ctx.mark_visited(resolved.id);

        let capabilities = self
            .accessor
            .capabilities(path)
            .map_err(|e| root_error(path, e))?;
        let name = self
            .accessor
            .get_property(path, "name")
            .map_err(|e| root_error(path, e))?;
        let name = name_or_fallback(name);
        let node_type = node_type(capabilities.is_rack());

        debug!(path = %path, name = %name, node_type = node_type.as_str(), "walking root device");

        let macros = extract_parameters(self.accessor, self.ctx, path)
            .map_err(|e| root_error(path, e))?;

        let chains = if capabilities.is_rack() {
            Some(self.walk_chains(path, 0).map_err(|e| root_error(path, e))?)
        } else {
            None
        };

        Ok(RootDevice {
            name,
            path: path.to_string(),
            node_type,
            class_name: self.optional_property(path, "class_name")?,
            visible_macro_count: self.optional_property(path, "visible_macro_count")?,
            variation_count: self.optional_property(path, "variation_count")?,
            macros,
            chains,
        })
    }

    /// Walk device `index` of the chain at `chain_path`, at nesting `depth`.
    ///
    /// Only fatal accessor errors are returned; anything else becomes an
    /// inline [`ErrorMarker`].
    pub fn walk_device(
        &mut self,
        chain_path: &LomPath,
        index: usize,
        depth: usize,
    ) -> Result<DeviceEntry, AccessorError> {
        if depth > self.ctx.max_depth() {
            debug!(path = %chain_path, index, depth, "max depth exceeded");
            return Ok(DeviceEntry::DepthExceeded(DepthMarker {
                depth_exceeded: true,
            }));
        }

        let mut handle = self.ctx.handles().acquire();
        handle.target_child(chain_path, ContainerKind::Devices, index);

        let resolved = match self.accessor.resolve(handle.path()) {
            Ok(r) if r.exists => r,
            Ok(_) => {
                let error = AccessorError::invalid_path(handle.path());
                return self.device_failed(handle.path(), index, error);
            }
            Err(e) => return self.device_failed(handle.path(), index, e),
        };
        handle.bind(resolved.id);

        if !self.ctx.mark_visited(resolved.id) {
            debug!(path = %handle.path(), id = %resolved.id, "already visited");
            return Ok(DeviceEntry::Circular(CircularMarker {
                circular: true,
                reference_id: resolved.id,
            }));
        }

        match self.device_record(handle.path(), index, depth) {
            Ok(record) => Ok(DeviceEntry::Device(record)),
            Err(e) => self.device_failed(handle.path(), index, e),
        }
    }

    fn device_record(
        &mut self,
        path: &LomPath,
        index: usize,
        depth: usize,
    ) -> Result<DeviceRecord, AccessorError> {
        let capabilities = self.accessor.capabilities(path)?;
        let name = name_or_fallback(self.accessor.get_property(path, "name")?);
        let node_type = node_type(capabilities.is_rack());

        debug!(path = %path, depth, name = %name, node_type = node_type.as_str(), "device");

        let parameters = extract_parameters(self.accessor, self.ctx, path)?;
        let chains = if capabilities.is_rack() {
            debug!(path = %path, "nested rack, descending");
            Some(self.walk_chains(path, depth)?)
        } else {
            None
        };

        Ok(DeviceRecord {
            device_id: index,
            name,
            path: path.to_string(),
            depth,
            node_type,
            parameters,
            chains,
        })
    }

    /// Walk every chain of the rack at `rack_path`, which sits at `rack_depth`.
    fn walk_chains(
        &mut self,
        rack_path: &LomPath,
        rack_depth: usize,
    ) -> Result<Vec<ChainEntry>, AccessorError> {
        let count = self.accessor.child_count(rack_path, ContainerKind::Chains)?;
        debug!(path = %rack_path, count, "chains");

        let mut chains = Vec::with_capacity(count);
        for index in 0..count {
            chains.push(self.walk_chain(rack_path, index, rack_depth + 1)?);
        }
        Ok(chains)
    }

    fn walk_chain(
        &mut self,
        rack_path: &LomPath,
        index: usize,
        depth: usize,
    ) -> Result<ChainEntry, AccessorError> {
        if depth > self.ctx.max_depth() {
            debug!(path = %rack_path, index, depth, "max depth exceeded");
            return Ok(ChainEntry::DepthExceeded(DepthMarker {
                depth_exceeded: true,
            }));
        }

        let mut handle = self.ctx.handles().acquire();
        handle.target_child(rack_path, ContainerKind::Chains, index);
        let path = handle.path();

        let count = match self.accessor.child_count(path, ContainerKind::Devices) {
            Ok(count) => count,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!(path = %path, index, error = %e, "chain failed");
                self.ctx.node_errors += 1;
                return Ok(ChainEntry::Failed(ErrorMarker {
                    name: format!("Chain {}", index),
                    error: e.to_string(),
                }));
            }
        };
        debug!(path = %path, depth, count, "chain devices");

        let mut devices = Vec::with_capacity(count);
        for device_index in 0..count {
            devices.push(self.walk_device(path, device_index, depth + 1)?);
        }

        Ok(ChainEntry::Chain(ChainRecord {
            chain_id: index,
            path: path.to_string(),
            depth,
            devices,
        }))
    }

    fn device_failed(
        &mut self,
        path: &LomPath,
        index: usize,
        error: AccessorError,
    ) -> Result<DeviceEntry, AccessorError> {
        if error.is_fatal() {
            return Err(error);
        }
        warn!(path = %path, index, error = %error, "device failed");
        self.ctx.node_errors += 1;
        Ok(DeviceEntry::Failed(ErrorMarker {
            name: format!("Device {}", index),
            error: error.to_string(),
        }))
    }

    /// Non-essential property: read failures and corruption both become null.
    fn optional_property(
        &self,
        path: &LomPath,
        name: &str,
    ) -> Result<LomValue, ExtractError> {
        match self.accessor.get_property(path, name) {
            Ok(value) => Ok(normalize(value)),
            Err(e) if e.is_fatal() => Err(ExtractError::Accessor(e)),
            Err(e) => {
                warn!(path = %path, property = name, error = %e, "could not read property");
                Ok(LomValue::Null)
            }
        }
    }
}

fn node_type(is_rack: bool) -> NodeType {
    if is_rack {
        NodeType::Rack
    } else {
        NodeType::Device
    }
}

fn root_error(path: &LomPath, error: AccessorError) -> ExtractError {
    if error.is_fatal() {
        ExtractError::Accessor(error)
    } else {
        ExtractError::RootUnresolvable {
            path: path.to_string(),
            reason: error.to_string(),
        }
    }
}
