// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pcaflow contributors

//! Per-stage configuration derivation
//!
//! [`ConfigDeriver::derive`] is a pure function of the base configuration,
//! the stage and the artifacts recorded for upstream stages. Output paths
//! depend only on the naming roots, so they are the same on every call.

use std::collections::BTreeMap;
use std::path::PathBuf;

use super::partition::CHROMOSOME_PLACEHOLDER;
use super::{PartitionRange, StageCommand, StageId, StageSpec};
use crate::config::{Artifact, BaseConfig, StageConfig, CONFIG_PREFIX, DATA_PREFIX, PLOTS_PREFIX};
use crate::errors::{PipelineError, PipelineResult};

/// Key under which `pca` receives the pruned variant set
pub const VARIANT_INCLUDE_FILE: &str = "variant_include_file";

/// Artifacts recorded for stages that have been derived
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageOutputs {
    outputs: BTreeMap<StageId, Vec<Artifact>>,
}

impl StageOutputs {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outputs of a derived stage
    pub fn record(&mut self, config: &StageConfig) {
        self.outputs
            .insert(config.stage(), config.outputs().to_vec());
    }

    /// Artifact written by `stage` under `key`
    pub fn artifact(&self, stage: StageId, key: &str) -> Option<&Artifact> {
        self.outputs.get(&stage)?.iter().find(|a| a.key == key)
    }

    fn require(&self, consumer: StageId, stage: StageId, key: &str) -> PipelineResult<&Artifact> {
        self.artifact(stage, key)
            .ok_or_else(|| PipelineError::UnresolvedPredecessor {
                stage: consumer.to_string(),
                predecessor: stage.to_string(),
            })
    }
}

/// Which variants the PCA stage uses
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariantSelection {
    /// The combined LD-pruned variant set
    Pruned(Artifact),
    /// No variant filter
    AllVariants,
}

impl VariantSelection {
    /// Pruned iff the combine stage was derived
    pub fn from_outputs(outputs: &StageOutputs) -> Self {
        match outputs.artifact(StageId::CombineVariants, "out_file") {
            Some(artifact) => Self::Pruned(artifact.clone()),
            None => Self::AllVariants,
        }
    }
}

/// Derives stage configuration for one run
#[derive(Debug, Clone)]
pub struct ConfigDeriver<'a> {
    partitions: &'a PartitionRange,
}

impl<'a> ConfigDeriver<'a> {
    /// Create a deriver for a run over `partitions`
    pub fn new(partitions: &'a PartitionRange) -> Self {
        Self { partitions }
    }

    /// Where a stage's configuration is persisted
    ///
    /// `<config_prefix>_<script>.config`; the join stage has no file.
    pub fn config_path(base: &BaseConfig, spec: &StageSpec) -> PipelineResult<Option<PathBuf>> {
        match spec.command {
            StageCommand::RScript(stem) => {
                let prefix = base.require(CONFIG_PREFIX, spec.id)?;
                Ok(Some(PathBuf::from(format!("{}_{}.config", prefix, stem))))
            }
            StageCommand::Cleanup => Ok(None),
        }
    }

    /// Derive the configuration for `spec`
    pub fn derive(
        &self,
        base: &BaseConfig,
        spec: &StageSpec,
        inputs: &StageOutputs,
    ) -> PipelineResult<StageConfig> {
        let id = spec.id;
        let data = |suffix: &str| -> PipelineResult<String> {
            Ok(format!("{}{}", base.require(DATA_PREFIX, id)?, suffix))
        };
        let plots = |suffix: &str| -> PipelineResult<String> {
            Ok(format!("{}{}", base.require(PLOTS_PREFIX, id)?, suffix))
        };
        let partitioned = |stem: &str, ext: &str| -> PipelineResult<String> {
            data(&format!("_{}_chr{}.{}", stem, CHROMOSOME_PLACEHOLDER, ext))
        };

        let mut entries = base.entries().clone();
        let mut outputs = Vec::new();

        match id {
            StageId::FindUnrelated => {
                outputs.push(Artifact::single("out_related_file", data("_related.RData")?));
                outputs.push(Artifact::single("out_unrelated_file", data("_unrelated.RData")?));
            }
            StageId::LdPruning => {
                let unrelated = inputs.require(id, StageId::FindUnrelated, "out_unrelated_file")?;
                entries.insert("sample_include_file".into(), unrelated.path.clone());
                outputs.push(Artifact::per_partition(
                    "out_file",
                    partitioned("pruned_variants", "RData")?,
                ));
            }
            StageId::CombineVariants => {
                let pruned = inputs.require(id, StageId::LdPruning, "out_file")?;
                entries = BTreeMap::new();
                entries.insert("chromosomes".into(), self.partitions.config_list());
                entries.insert("in_file".into(), pruned.path.clone());
                outputs.push(Artifact::single("out_file", data("_pruned_variants.RData")?));
            }
            StageId::Pca => {
                let related = inputs.require(id, StageId::FindUnrelated, "out_related_file")?;
                let unrelated = inputs.require(id, StageId::FindUnrelated, "out_unrelated_file")?;
                entries.insert("related_file".into(), related.path.clone());
                entries.insert("unrelated_file".into(), unrelated.path.clone());

                match VariantSelection::from_outputs(inputs) {
                    VariantSelection::Pruned(variants) => {
                        entries.insert(VARIANT_INCLUDE_FILE.into(), variants.path);
                    }
                    VariantSelection::AllVariants => {
                        entries.remove(VARIANT_INCLUDE_FILE);
                    }
                }

                outputs.push(Artifact::single("out_file", data("_pcair.RData")?));
                outputs.push(Artifact::single("out_file_unrel", data("_pcair_unrel.RData")?));
            }
            StageId::PcaPlots => {
                let pca = inputs.require(id, StageId::Pca, "out_file")?;
                entries.insert("pca_file".into(), pca.path.clone());
                outputs.push(Artifact::single("out_file_scree", plots("_pca_scree.pdf")?));
                outputs.push(Artifact::single("out_file_pc12", plots("_pca_pc12.pdf")?));
                outputs.push(Artifact::single("out_file_parcoord", plots("_pca_parcoord.pdf")?));
                outputs.push(Artifact::single("out_file_pairs", plots("_pca_pairs.png")?));
            }
            StageId::PcaCorr => {
                let pca = inputs.require(id, StageId::Pca, "out_file_unrel")?;
                entries.insert("pca_file".into(), pca.path.clone());
                outputs.push(Artifact::per_partition(
                    "out_file",
                    partitioned("pcair_corr", "gds")?,
                ));
            }
            StageId::PcaCorrPlots => {
                let corr = inputs.require(id, StageId::PcaCorr, "out_file")?;
                entries.insert("chromosomes".into(), self.partitions.config_list());
                entries.insert("corr_file".into(), corr.path.clone());
                outputs.push(Artifact::single("out_prefix", plots("_pcair_corr")?));
            }
            StageId::Join => {
                entries = BTreeMap::new();
            }
        }

        for artifact in &outputs {
            entries.insert(artifact.key.clone(), artifact.path.clone());
        }

        let path = Self::config_path(base, spec)?;
        Ok(StageConfig::new(id, entries, outputs, path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::definition::stage;

    fn base() -> BaseConfig {
        BaseConfig::from_entries([
            (DATA_PREFIX, "study1"),
            (PLOTS_PREFIX, "study1"),
            (CONFIG_PREFIX, "study1"),
            ("gds_file", "study1_chr .gds"),
        ])
    }

    fn derive_chain(ids: &[StageId], partitions: &PartitionRange) -> (StageOutputs, Vec<StageConfig>) {
        let deriver = ConfigDeriver::new(partitions);
        let mut outputs = StageOutputs::new();
        let mut configs = Vec::new();
        for id in ids {
            let config = deriver
                .derive(&base(), stage(*id).unwrap(), &outputs)
                .unwrap();
            outputs.record(&config);
            configs.push(config);
        }
        (outputs, configs)
    }

    #[test]
    fn test_find_unrelated_paths() {
        let partitions = PartitionRange::parse("1-3").unwrap();
        let (_, configs) = derive_chain(&[StageId::FindUnrelated], &partitions);
        let config = &configs[0];

        assert_eq!(config.get("out_related_file"), Some("study1_related.RData"));
        assert_eq!(config.get("out_unrelated_file"), Some("study1_unrelated.RData"));
        // base keys copied forward
        assert_eq!(config.get("gds_file"), Some("study1_chr .gds"));
        assert_eq!(
            config.path(),
            Some(std::path::Path::new("study1_find_unrelated.config"))
        );
    }

    #[test]
    fn test_pca_without_pruning_has_no_variant_key() {
        let partitions = PartitionRange::parse("1-3").unwrap();
        let (_, configs) = derive_chain(&[StageId::FindUnrelated, StageId::Pca], &partitions);
        let pca = &configs[1];

        assert!(!pca.contains_key(VARIANT_INCLUDE_FILE));
        assert_eq!(pca.get("related_file"), Some("study1_related.RData"));
        assert_eq!(pca.get("out_file"), Some("study1_pcair.RData"));
        assert_eq!(pca.get("out_file_unrel"), Some("study1_pcair_unrel.RData"));
    }

    #[test]
    fn test_pca_with_pruning_points_at_combined_output() {
        let partitions = PartitionRange::parse("2,5,9").unwrap();
        let (outputs, configs) = derive_chain(
            &[
                StageId::FindUnrelated,
                StageId::LdPruning,
                StageId::CombineVariants,
                StageId::Pca,
            ],
            &partitions,
        );

        let combined = outputs
            .artifact(StageId::CombineVariants, "out_file")
            .unwrap();
        assert_eq!(configs[3].get(VARIANT_INCLUDE_FILE), Some(combined.path.as_str()));
        assert_eq!(combined.path, "study1_pruned_variants.RData");
    }

    #[test]
    fn test_pca_without_pruning_drops_stale_variant_key() {
        let partitions = PartitionRange::parse("1-3").unwrap();
        let deriver = ConfigDeriver::new(&partitions);
        let mut entries = base().entries().clone();
        entries.insert(VARIANT_INCLUDE_FILE.into(), "old_pruned_variants.RData".into());
        let base = BaseConfig::from_entries(entries);

        let mut outputs = StageOutputs::new();
        let unrelated = deriver
            .derive(&base, stage(StageId::FindUnrelated).unwrap(), &outputs)
            .unwrap();
        // base entries are still copied forward elsewhere
        assert_eq!(
            unrelated.get(VARIANT_INCLUDE_FILE),
            Some("old_pruned_variants.RData")
        );
        outputs.record(&unrelated);

        let pca = deriver
            .derive(&base, stage(StageId::Pca).unwrap(), &outputs)
            .unwrap();
        assert!(!pca.contains_key(VARIANT_INCLUDE_FILE));
        assert!(!pca.render().contains(VARIANT_INCLUDE_FILE));
    }

    #[test]
    fn test_ld_pruning_and_combine_config() {
        let partitions = PartitionRange::parse("2,5,9").unwrap();
        let (_, configs) = derive_chain(
            &[StageId::FindUnrelated, StageId::LdPruning, StageId::CombineVariants],
            &partitions,
        );

        let ld = &configs[1];
        assert_eq!(ld.get("sample_include_file"), Some("study1_unrelated.RData"));
        assert_eq!(ld.get("out_file"), Some("study1_pruned_variants_chr .RData"));
        assert!(ld.output("out_file").unwrap().per_partition);

        let combine = &configs[2];
        // fresh map, nothing copied from the base
        assert_eq!(combine.entries().len(), 3);
        assert_eq!(combine.get("chromosomes"), Some("2 5 9"));
        assert_eq!(combine.get("in_file"), Some("study1_pruned_variants_chr .RData"));
    }

    #[test]
    fn test_correlation_stages() {
        let partitions = PartitionRange::parse("1-3").unwrap();
        let (_, configs) = derive_chain(
            &[
                StageId::FindUnrelated,
                StageId::Pca,
                StageId::PcaPlots,
                StageId::PcaCorr,
                StageId::PcaCorrPlots,
            ],
            &partitions,
        );

        assert_eq!(configs[2].get("pca_file"), Some("study1_pcair.RData"));
        assert_eq!(configs[2].get("out_file_pairs"), Some("study1_pca_pairs.png"));
        assert_eq!(configs[3].get("pca_file"), Some("study1_pcair_unrel.RData"));
        assert_eq!(configs[3].get("out_file"), Some("study1_pcair_corr_chr .gds"));
        assert_eq!(configs[4].get("corr_file"), Some("study1_pcair_corr_chr .gds"));
        assert_eq!(configs[4].get("chromosomes"), Some("1 2 3"));
        assert_eq!(configs[4].get("out_prefix"), Some("study1_pcair_corr"));
    }

    #[test]
    fn test_derivation_is_idempotent() {
        let partitions = PartitionRange::parse("1-22").unwrap();
        let (outputs, _) = derive_chain(&[StageId::FindUnrelated], &partitions);
        let deriver = ConfigDeriver::new(&partitions);
        let spec = stage(StageId::Pca).unwrap();

        let first = deriver.derive(&base(), spec, &outputs).unwrap();
        let second = deriver.derive(&base(), spec, &outputs).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.render().as_bytes(), second.render().as_bytes());
    }

    #[test]
    fn test_missing_naming_root() {
        let partitions = PartitionRange::parse("1").unwrap();
        let deriver = ConfigDeriver::new(&partitions);
        let base = BaseConfig::from_entries([(CONFIG_PREFIX, "x")]);

        let err = deriver
            .derive(&base, stage(StageId::FindUnrelated).unwrap(), &StageOutputs::new())
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::ConfigDerive { ref stage, ref key } if stage == "find-unrelated" && key == DATA_PREFIX
        ));
    }

    #[test]
    fn test_missing_upstream_artifact() {
        let partitions = PartitionRange::parse("1").unwrap();
        let deriver = ConfigDeriver::new(&partitions);

        let err = deriver
            .derive(&base(), stage(StageId::PcaPlots).unwrap(), &StageOutputs::new())
            .unwrap_err();
        assert!(matches!(err, PipelineError::UnresolvedPredecessor { .. }));
    }

    #[test]
    fn test_join_has_no_config_file() {
        let partitions = PartitionRange::parse("1").unwrap();
        let deriver = ConfigDeriver::new(&partitions);

        let config = deriver
            .derive(&base(), stage(StageId::Join).unwrap(), &StageOutputs::new())
            .unwrap();
        assert!(config.entries().is_empty());
        assert_eq!(config.path(), None);
    }
}
