//! One module per data source. Every converter walks its data directory,
//! validates rows, and emits typed records through the shared [`Run`].

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::dir::DataDir;
use crate::error::EtlError;
use crate::item::ItemSink;
use crate::run::Run;

pub mod depmap_ccle_mutations;
pub mod depmap_cnv;
pub mod depmap_demeter2;
pub mod depmap_expression;
pub mod depmap_proteomics;
pub mod depmap_sanger_crispr;
pub mod dgidb;
pub mod disgenet;
pub mod opentargets;
pub mod storm_aelian;
pub mod storm_nanopore;
pub mod storm_rnaseq;
pub mod storm_targets_analyses;
pub mod storm_targets_correlations;
pub mod storm_targets_metadata;
pub mod tcga_sample_metadata;
pub mod tcga_somatic_mutation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Source {
    DepmapCcleMutations,
    DepmapCnv,
    DepmapDemeter2,
    DepmapExpression,
    DepmapProteomics,
    DepmapSangerCrispr,
    Dgidb,
    Disgenet,
    Opentargets,
    StormAelian,
    StormNanopore,
    StormRnaseq,
    StormTargetsAnalyses,
    StormTargetsCorrelations,
    StormTargetsMetadata,
    TcgaSampleMetadata,
    TcgaSomaticMutation,
}

impl Source {
    pub fn name(&self) -> &'static str {
        match self {
            Source::DepmapCcleMutations => "depmap-ccle-mutations",
            Source::DepmapCnv => "depmap-cnv",
            Source::DepmapDemeter2 => "depmap-demeter2",
            Source::DepmapExpression => "depmap-expression",
            Source::DepmapProteomics => "depmap-proteomics",
            Source::DepmapSangerCrispr => "depmap-sanger-crispr",
            Source::Dgidb => "dgidb",
            Source::Disgenet => "disgenet",
            Source::Opentargets => "opentargets",
            Source::StormAelian => "storm-aelian",
            Source::StormNanopore => "storm-nanopore",
            Source::StormRnaseq => "storm-rnaseq",
            Source::StormTargetsAnalyses => "storm-targets-analyses",
            Source::StormTargetsCorrelations => "storm-targets-correlations",
            Source::StormTargetsMetadata => "storm-targets-metadata",
            Source::TcgaSampleMetadata => "tcga-sample-metadata",
            Source::TcgaSomaticMutation => "tcga-somatic-mutation",
        }
    }

    pub const ALL: [Source; 17] = [
        Source::DepmapCcleMutations,
        Source::DepmapCnv,
        Source::DepmapDemeter2,
        Source::DepmapExpression,
        Source::DepmapProteomics,
        Source::DepmapSangerCrispr,
        Source::Dgidb,
        Source::Disgenet,
        Source::Opentargets,
        Source::StormAelian,
        Source::StormNanopore,
        Source::StormRnaseq,
        Source::StormTargetsAnalyses,
        Source::StormTargetsCorrelations,
        Source::StormTargetsMetadata,
        Source::TcgaSampleMetadata,
        Source::TcgaSomaticMutation,
    ];

    pub fn dataset_title(&self) -> &'static str {
        match self {
            Source::DepmapCcleMutations => "DepMap CCLE Mutations Data",
            Source::DepmapCnv => "DepMap Copy Number",
            Source::DepmapDemeter2 => "DepMap DEMETER2 Gene Dependency",
            Source::DepmapExpression => "DepMap Expression Data",
            Source::DepmapProteomics => "DepMap CCLE Proteomics Data",
            Source::DepmapSangerCrispr => "DepMap Sanger CRISPR",
            Source::Dgidb => "DGIdb Dataset",
            Source::Disgenet => "DisGeNET",
            Source::Opentargets => "OpenTargets Associations",
            Source::StormAelian => "STORM Aelian Data",
            Source::StormNanopore => "STORM Nanopore Data",
            Source::StormRnaseq => "STORM RNA-Seq Data",
            Source::StormTargetsAnalyses => "STORM Targets Analyses",
            Source::StormTargetsCorrelations => "STORM Correlations Analyses",
            Source::StormTargetsMetadata => "STORM Targets Metadata",
            Source::TcgaSampleMetadata => "TCGA Sample Metadata",
            Source::TcgaSomaticMutation => "TCGA Mutation Data",
        }
    }

    pub fn convert<S: ItemSink>(&self, run: &mut Run<S>, dir: &DataDir) -> Result<(), EtlError> {
        match self {
            Source::DepmapCcleMutations => depmap_ccle_mutations::run(run, dir),
            Source::DepmapCnv => depmap_cnv::run(run, dir),
            Source::DepmapDemeter2 => depmap_demeter2::run(run, dir),
            Source::DepmapExpression => depmap_expression::run(run, dir),
            Source::DepmapProteomics => depmap_proteomics::run(run, dir),
            Source::DepmapSangerCrispr => depmap_sanger_crispr::run(run, dir),
            Source::Dgidb => dgidb::run(run, dir),
            Source::Disgenet => disgenet::run(run, dir),
            Source::Opentargets => opentargets::run(run, dir),
            Source::StormAelian => storm_aelian::run(run, dir),
            Source::StormNanopore => storm_nanopore::run(run, dir),
            Source::StormRnaseq => storm_rnaseq::run(run, dir),
            Source::StormTargetsAnalyses => storm_targets_analyses::run(run, dir),
            Source::StormTargetsCorrelations => storm_targets_correlations::run(run, dir),
            Source::StormTargetsMetadata => storm_targets_metadata::run(run, dir),
            Source::TcgaSampleMetadata => tcga_sample_metadata::run(run, dir),
            Source::TcgaSomaticMutation => tcga_somatic_mutation::run(run, dir),
        }
    }
}

/// DepMap matrix headers label genes as `"SYMBOL (IDENTIFIER)"`; only the
/// leading symbol token takes part in resolution.
pub(crate) fn gene_token(header: &str) -> &str {
    header.split(' ').next().unwrap_or("").trim()
}

/// Standard cell-line interner shared by the DepMap-family converters:
/// cell lines are keyed by their DepMap identifier.
pub(crate) fn cell_line<S: ItemSink>(
    run: &mut Run<S>,
    cell_lines: &mut crate::intern::Interner,
    depmap_id: &str,
) -> Result<crate::item::ItemRef, EtlError> {
    cell_lines.get_or_create(depmap_id, run.sink_mut(), || {
        let mut item = crate::item::Item::new("CellLine");
        item.set_attribute("DepMapID", depmap_id);
        item
    })
}
