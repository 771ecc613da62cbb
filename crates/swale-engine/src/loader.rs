//! Stock [`ProjectLoader`] implementations.

use std::path::Path;

use swale_core::{LoadError, Project, ProjectLoader};

/// Hands out clones of an in-memory project, whatever the input path.
#[derive(Clone, Debug)]
pub struct StaticLoader {
    project: Project,
}

impl StaticLoader {
    /// Loader for `project`.
    pub fn new(project: Project) -> Self {
        Self { project }
    }
}

impl ProjectLoader for StaticLoader {
    fn load(&self, _input: &Path) -> Result<Project, LoadError> {
        Ok(self.project.clone())
    }
}

/// Reads unit hydrographs from a `[HYDROGRAPHS]` table at the input path
/// and merges them into a base project.
#[derive(Clone, Debug)]
pub struct TableLoader {
    base: Project,
}

impl TableLoader {
    /// Loader merging tables into `base`.
    pub fn new(base: Project) -> Self {
        Self { base }
    }
}

impl ProjectLoader for TableLoader {
    fn load(&self, input: &Path) -> Result<Project, LoadError> {
        let hydrographs = swale_rdii::read_hydrographs(input)?;
        let mut project = self.base.clone();
        swale_rdii::merge_into(&mut project, hydrographs)?;
        Ok(project)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ApiError, Simulation};
    use swale_core::{Rtk, RtkTable};
    use swale_test_utils::fixtures;

    #[test]
    fn table_loader_replaces_hydrographs_from_file() {
        let path = std::env::temp_dir().join(format!("swale-loader-{}.inp", std::process::id()));
        std::fs::write(
            &path,
            "[HYDROGRAPHS]\nUH1 RG1\nUH1 All Short 0.04 0.5 1.0\nUH1 Jul Long 0.06 12 2\n",
        )
        .unwrap();
        let loader = TableLoader::new(fixtures::rdii_network(fixtures::typical_rtk()));
        let mut sim = Simulation::with_reference_models(loader);
        let opened = sim.open(&path, "r.rpt", "r.out");
        std::fs::remove_file(&path).unwrap();
        opened.unwrap();

        let mut expected = RtkTable::default();
        for month in 0..12 {
            expected.set(month, 0, Rtk::new(0.04, 0.5, 1.0));
        }
        expected.set(6, 2, Rtk::new(0.06, 12.0, 2.0));
        assert_eq!(sim.rdii_params(0).unwrap(), expected);
    }

    #[test]
    fn table_loader_reports_missing_file() {
        let loader = TableLoader::new(fixtures::gage_network());
        let mut sim = Simulation::with_reference_models(loader);
        match sim.open("/nonexistent/swale/input.inp", "r.rpt", "r.out") {
            Err(ApiError::Load(LoadError::Io { .. })) => {}
            other => panic!("expected an I/O load error, got {other:?}"),
        }
    }
}
