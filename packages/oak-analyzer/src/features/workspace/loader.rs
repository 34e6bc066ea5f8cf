//! UnitLoader - where resolvers get units from
//!
//! A [`Program`] loads through the shared workspace and records every import
//! edge it follows; a bare `&Workspace` loads without recording anything and
//! serves ad-hoc scans (domain model, components).

use std::path::Path;
use std::sync::Arc;

use super::{Program, Workspace};
use crate::errors::Result;
use crate::features::parsing::SourceUnit;

pub trait UnitLoader {
    fn load_unit(&mut self, path: &Path) -> Result<Arc<SourceUnit>>;

    /// Called for every resolved import edge `from -> to`
    fn record_edge(&mut self, _from: &Path, _to: &Path) {}
}

impl UnitLoader for Program {
    fn load_unit(&mut self, path: &Path) -> Result<Arc<SourceUnit>> {
        self.unit(path)
    }

    fn record_edge(&mut self, from: &Path, to: &Path) {
        self.record_import(from, to);
    }
}

impl UnitLoader for &Workspace {
    fn load_unit(&mut self, path: &Path) -> Result<Arc<SourceUnit>> {
        self.load(path)
    }
}
