use super::assembler::Assembler;
use crate::config::Config;
use crate::datasources::{mean_awc, ExtraOpsTable, HydrologyProvider};
use crate::error::{IrrSchedError, Result};
use crate::format::{format_schedule, RecordFamily};
use crate::models::{CropPolicy, PolicyVariant, TriggerState};
use crate::patcher::MgtFile;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// How one field unit's run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum RunStatus {
    Completed { records: usize },
    /// Crop not in the policy table: out of study scope, not an error.
    Skipped { crop: String },
    Failed { reason: String },
}

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub file: PathBuf,
    pub status: RunStatus,
}

/// Processes every management file in the working directory, one field unit
/// at a time. A failing field unit is reported and the batch moves on; its
/// file is left untouched past the header.
pub struct BatchRunner<'a> {
    config: &'a Config,
    provider: &'a dyn HydrologyProvider,
    extra_ops_cache: HashMap<String, ExtraOpsTable>,
}

impl<'a> BatchRunner<'a> {
    pub fn new(config: &'a Config, provider: &'a dyn HydrologyProvider) -> Self {
        Self {
            config,
            provider,
            extra_ops_cache: HashMap::new(),
        }
    }

    pub fn run(&mut self) -> Result<Vec<RunOutcome>> {
        let mut outcomes = Vec::new();
        for path in self.management_files()? {
            let status = match self.run_field_unit(&path) {
                Ok(status) => status,
                Err(e) => RunStatus::Failed {
                    reason: e.to_string(),
                },
            };
            match &status {
                RunStatus::Completed { records } => {
                    info!(file = %path.display(), records, "patched")
                }
                RunStatus::Skipped { crop } => {
                    info!(file = %path.display(), %crop, "skipped: crop not configured")
                }
                RunStatus::Failed { reason } => {
                    error!(file = %path.display(), %reason, "field unit failed")
                }
            }
            outcomes.push(RunOutcome { file: path, status });
        }
        Ok(outcomes)
    }

    fn management_files(&self) -> Result<Vec<PathBuf>> {
        let dir = &self.config.paths.mgt_dir;
        let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "mgt"))
            .collect();
        files.sort();
        if files.is_empty() {
            warn!(dir = %dir.display(), "no .mgt files found");
        }
        Ok(files)
    }

    /// The whole pipeline for one field unit: header tags, policy lookup,
    /// soil capacity, schedule assembly, formatting, patch. The patched
    /// content is built fully before any write.
    fn run_field_unit(&mut self, path: &Path) -> Result<RunStatus> {
        let config = self.config;
        let provider = self.provider;
        let mgt = MgtFile::open(path)?;

        let Some(policy) = config.crops.get(&mgt.context.crop) else {
            return Ok(RunStatus::Skipped {
                crop: mgt.context.crop.clone(),
            });
        };

        let mut state = match policy.variant.uses_soil_data() {
            true => TriggerState::with_capacity(self.field_capacity(path, policy)?),
            false => TriggerState::new(),
        };

        self.load_extra_ops(&mgt.context.crop, policy)?;
        let extra_ops = &self.extra_ops_cache[&mgt.context.crop];
        let assembler = Assembler::new(
            policy,
            &mgt.context,
            provider,
            extra_ops,
            config.simulation.calibration_start_year,
        );
        let items = assembler.assemble(
            config.simulation.start,
            config.simulation.end,
            &mut state,
        )?;

        let family = match policy.variant {
            PolicyVariant::FixedDate => RecordFamily::Calendar,
            _ => RecordFamily::SoilWater,
        };
        let records = items.iter().filter(|i| i.is_operation()).count();
        mgt.write_schedule(&format_schedule(&items, family))?;
        Ok(RunStatus::Completed { records })
    }

    /// AWC = mean soil available-water coefficient x crop rooting depth,
    /// from the `.sol` file sharing the management file's stem.
    fn field_capacity(&self, mgt_path: &Path, policy: &CropPolicy) -> Result<f64> {
        let sol_dir = self.config.paths.sol_dir.as_ref().ok_or_else(|| {
            IrrSchedError::Config(
                "threshold policies require paths.sol-dir in the configuration".to_string(),
            )
        })?;
        let stem = mgt_path
            .file_stem()
            .ok_or_else(|| IrrSchedError::InvalidData(format!("bad path {}", mgt_path.display())))?;
        let sol_path = sol_dir.join(stem).with_extension("sol");
        Ok(mean_awc(&sol_path)? * policy.rooting_depth_mm)
    }

    fn load_extra_ops(&mut self, crop: &str, policy: &CropPolicy) -> Result<()> {
        if !self.extra_ops_cache.contains_key(crop) {
            let table = match &policy.operations {
                Some(path) => ExtraOpsTable::from_path(path)?,
                None => ExtraOpsTable::empty(),
            };
            self.extra_ops_cache.insert(crop.to_string(), table);
        }
        Ok(())
    }
}

/// Batch-wide tallies for the end-of-run report.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub completed: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn tally(outcomes: &[RunOutcome]) -> Self {
        let mut summary = Self::default();
        for outcome in outcomes {
            match outcome.status {
                RunStatus::Completed { .. } => summary.completed += 1,
                RunStatus::Skipped { .. } => summary.skipped += 1,
                RunStatus::Failed { .. } => summary.failed += 1,
            }
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PathsConfig, SimulationConfig};
    use crate::datasources::HruDaily;
    use crate::models::{SeasonDate, SourceSplit};
    use chrono::NaiveDate;
    use std::io::Write;

    struct WetProvider;

    impl HydrologyProvider for WetProvider {
        fn daily(&self, _hru: u32, _date: NaiveDate) -> Result<HruDaily> {
            Ok(HruDaily {
                pet_mm: 4.0,
                lai: 1.5,
                sw_end_mm: 500.0,
            })
        }
    }

    fn write_mgt(dir: &Path, name: &str, crop: &str) -> PathBuf {
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        let header = format!(
            " .mgt file Watershed HRU:139 Subbasin:10 HRU:3 Luse:{} written for testing\n\
             Irrigation operation:\n\
             Operation Schedule:                                                            \n",
            crop
        );
        f.write_all(header.as_bytes()).unwrap();
        path
    }

    fn config(dir: &Path) -> Config {
        let mut crops = HashMap::new();
        crops.insert(
            "CORN".to_string(),
            CropPolicy {
                variant: PolicyVariant::FixedDate,
                season_start: SeasonDate { month: 5, day: 7 },
                season_end: SeasonDate { month: 10, day: 25 },
                depth_mm: 50.0,
                interval_days: 14,
                rooting_depth_mm: 600.0,
                split: SourceSplit::default(),
                groundwater_depth_mm: 36.5,
                surface_depth_mm: 13.5,
                water_stress_threshold: 35.32,
                operations: None,
            },
        );
        Config {
            simulation: SimulationConfig {
                start: NaiveDate::from_ymd_opt(2011, 1, 1).unwrap(),
                end: NaiveDate::from_ymd_opt(2011, 12, 31).unwrap(),
                calibration_start_year: 2011,
            },
            paths: PathsConfig {
                mgt_dir: dir.to_path_buf(),
                sol_dir: None,
                hru_output: dir.join("output.hru"),
            },
            crops,
        }
    }

    #[test]
    fn batch_isolates_failures_and_reports_all_units() {
        let dir = tempfile::tempdir().unwrap();
        write_mgt(dir.path(), "000010001.mgt", "CORN");
        write_mgt(dir.path(), "000010002.mgt", "FRSD"); // unconfigured
        // Header with no tags at all.
        std::fs::write(dir.path().join("000010003.mgt"), "garbage\n").unwrap();

        let config = config(dir.path());
        let provider = WetProvider;
        let mut runner = BatchRunner::new(&config, &provider);
        let outcomes = runner.run().unwrap();

        assert_eq!(outcomes.len(), 3);
        let summary = RunSummary::tally(&outcomes);
        assert_eq!(summary.completed, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.failed, 1);
    }

    #[test]
    fn failed_unit_leaves_its_file_unmodified() {
        let dir = tempfile::tempdir().unwrap();
        // Tags present but no schedule marker: the patch offset is missing.
        let path = dir.path().join("000010009.mgt");
        let original = " .mgt Watershed HRU:7 Subbasin:2 Luse:CORN\nno marker here\n";
        std::fs::write(&path, original).unwrap();

        let config = config(dir.path());
        let provider = WetProvider;
        let mut runner = BatchRunner::new(&config, &provider);
        let outcomes = runner.run().unwrap();

        assert!(matches!(outcomes[0].status, RunStatus::Failed { .. }));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), original);
    }

    #[test]
    fn completed_unit_gets_records_appended_after_the_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_mgt(dir.path(), "000010001.mgt", "CORN");

        let config = config(dir.path());
        let provider = WetProvider;
        let mut runner = BatchRunner::new(&config, &provider);
        runner.run().unwrap();

        let patched = std::fs::read_to_string(&path).unwrap();
        assert!(patched.contains("Operation Schedule"));
        // Fixed-date + calendar family: two auto-irrigation lines.
        assert_eq!(patched.matches("        35.32000").count(), 2);
        assert!(patched.trim_end().ends_with("17"));
    }
}
