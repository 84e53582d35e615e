//! Batch pipeline: parse, extract, resolve, merge, detect, and map a set of
//! already-loaded source units.
//!
//! Units are processed in parallel and independently; a unit that fails to
//! parse is reported against its path and the rest of the batch continues.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rayon::prelude::*;
use revspec_core::config::{MapperConfig, RevspecConfig};
use revspec_core::errors::{ExtractionError, ParseError, PipelineError, PipelineResult};
use revspec_core::tracing::events;
use revspec_core::RevspecErrorCode;
use serde_json::{Map, Value};

use crate::actions::{EntityActions, UniversalActionMapper};
use crate::adapters::parse_with_budget;
use crate::canonical::{actions_map, entity_map, EntityView};
use crate::extractors::{extractor_for, ExtractionContext};
use crate::language::SourceLanguage;
use crate::model::{CanonicalAction, CanonicalEntity};
use crate::patterns::{translation_columns, DetectionResult, PatternOrchestrator};
use crate::relationships::{apply_foreign_keys, foreign_keys_from_tree, TableForeignKey};
use crate::translation::{merge, parent_table_name, MergedFieldMap};

/// One source file's text and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    pub path: PathBuf,
    pub content: String,
    /// Explicit language; detected from the path and content when absent.
    pub language: Option<SourceLanguage>,
}

impl SourceUnit {
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            language: None,
        }
    }

    pub fn with_language(mut self, language: SourceLanguage) -> Self {
        self.language = Some(language);
        self
    }

    /// Read a unit from disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| PipelineError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(Self::new(path, content))
    }

    /// Explicit language, else extension, else content sniffing.
    pub fn language(&self) -> Option<SourceLanguage> {
        self.language
            .or_else(|| SourceLanguage::detect(&self.path, &self.content))
    }
}

/// A parent entity together with its detection result and field map.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityRecord {
    pub entity: CanonicalEntity,
    /// Own fields, or merged with a paired translation table.
    pub fields: MergedFieldMap,
    pub detection: DetectionResult,
    /// Table name of the translation table folded into `fields`.
    pub translation_table: Option<String>,
}

/// Everything a batch produced.
#[derive(Debug, Default)]
pub struct BatchOutput {
    pub entities: Vec<EntityRecord>,
    pub actions: Vec<EntityActions>,
    /// Non-fatal diagnostics, keyed by source file.
    pub diagnostics: Vec<(PathBuf, ExtractionError)>,
    /// Candidates dropped below the confidence floor.
    pub omissions: usize,
    /// Entities with matched patterns whose aggregate confidence is below
    /// `patterns.min_confidence`.
    pub low_confidence: Vec<String>,
}

impl BatchOutput {
    pub fn entity(&self, name: &str) -> Option<&EntityRecord> {
        self.entities.iter().find(|r| r.entity.name == name)
    }

    pub fn action_group(&self, name: &str) -> Option<&EntityActions> {
        self.actions.iter().find(|g| g.name == name)
    }

    pub fn total_actions(&self) -> usize {
        self.actions.iter().map(|g| g.actions.len()).sum()
    }

    /// Canonical maps for every entity, then for action groups with no
    /// entity of their own.
    pub fn canonical_maps(&self, config: &MapperConfig) -> Vec<Map<String, Value>> {
        let include_metadata = config.effective_include_metadata();
        let mut maps: Vec<Map<String, Value>> = self
            .entities
            .iter()
            .map(|record| {
                let view = EntityView {
                    entity: &record.entity,
                    fields: &record.fields,
                    detection: &record.detection,
                    actions: self.action_group(&record.entity.name),
                };
                entity_map(view, include_metadata)
            })
            .collect();
        maps.extend(
            self.actions
                .iter()
                .filter(|g| self.entity(&g.name).is_none())
                .map(|g| actions_map(g, config.effective_default_schema(), include_metadata)),
        );
        maps
    }
}

/// What one unit yielded.
#[derive(Debug, Default)]
struct UnitExtraction {
    entities: Vec<CanonicalEntity>,
    actions: Vec<CanonicalAction>,
    foreign_keys: Vec<TableForeignKey>,
    diagnostics: Vec<ExtractionError>,
    omissions: usize,
}

fn process_unit(unit: &SourceUnit, config: &RevspecConfig) -> Result<UnitExtraction, PipelineError> {
    let max = config.extraction.effective_max_file_size();
    let size = unit.content.len() as u64;
    if size > max {
        return Err(PipelineError::SourceTooLarge {
            path: unit.path.clone(),
            size,
            max,
        });
    }

    let language = unit.language().ok_or_else(|| ParseError::UnsupportedLanguage {
        extension: unit
            .path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_string(),
    })?;
    let budget = Duration::from_millis(config.extraction.effective_parse_budget_ms());
    let tree = parse_with_budget(language, &unit.content, &unit.path, budget)?;

    let mut ctx = ExtractionContext::new(&unit.path, language)
        .with_confidence_floor(config.extraction.floor_for(language.name()))
        .with_default_schema(config.mapper.effective_default_schema());
    let extractor = extractor_for(language);
    let entities = extractor.extract_entities(&tree, &mut ctx);
    let actions = extractor.extract_actions(&tree, &mut ctx);
    let foreign_keys = match language {
        SourceLanguage::Sql => foreign_keys_from_tree(&tree),
        _ => Vec::new(),
    };
    let (diagnostics, omissions) = ctx.finish();

    tracing::debug!(
        path = %unit.path.display(),
        language = %language,
        entities_extracted = entities.len(),
        actions_extracted = actions.len(),
        low_confidence_omissions = omissions,
        unsupported_constructs = diagnostics.len(),
        "source unit extracted"
    );
    Ok(UnitExtraction {
        entities,
        actions,
        foreign_keys,
        diagnostics,
        omissions,
    })
}

/// Translation tables paired with their parents.
#[derive(Debug, Default)]
struct TranslationPairs {
    /// `(parent index, translation index)`; at most one per parent.
    merged: Vec<(usize, usize)>,
    /// Further translation tables of an already paired parent. These stay
    /// standalone entities.
    unpaired: Vec<(usize, usize)>,
}

impl TranslationPairs {
    fn translation_of(&self, parent: usize) -> Option<usize> {
        self.merged.iter().find(|(pi, _)| *pi == parent).map(|(_, ti)| *ti)
    }

    fn is_merged_translation(&self, index: usize) -> bool {
        self.merged.iter().any(|(_, ti)| *ti == index)
    }
}

/// Pair each structurally valid translation table with its same-schema
/// parent. The first translation table of a parent wins.
fn translation_pairs(entities: &[CanonicalEntity]) -> TranslationPairs {
    let mut pairs = TranslationPairs::default();
    for (ti, translation) in entities.iter().enumerate() {
        if translation_columns(translation).is_none() {
            continue;
        }
        let Some(parent_table) = parent_table_name(&translation.table_name) else {
            continue;
        };
        let Some(pi) = entities
            .iter()
            .position(|p| p.table_name == parent_table && p.schema == translation.schema)
        else {
            continue;
        };
        if pairs.translation_of(pi).is_some() {
            pairs.unpaired.push((pi, ti));
        } else {
            pairs.merged.push((pi, ti));
        }
    }
    pairs
}

/// Run the whole pipeline over `units`.
pub fn process_batch(units: &[SourceUnit], config: &RevspecConfig) -> PipelineResult<BatchOutput> {
    let start = Instant::now();
    let outcomes: Vec<(&Path, Result<UnitExtraction, PipelineError>)> = units
        .par_iter()
        .map(|unit| (unit.path.as_path(), process_unit(unit, config)))
        .collect();

    let mut result = PipelineResult::<BatchOutput>::default();
    let mut entities = Vec::new();
    let mut actions = Vec::new();
    let mut foreign_keys = Vec::new();
    for (path, outcome) in outcomes {
        match outcome {
            Ok(unit) => {
                entities.extend(unit.entities);
                actions.extend(unit.actions);
                foreign_keys.extend(unit.foreign_keys);
                result.data.omissions += unit.omissions;
                result
                    .data
                    .diagnostics
                    .extend(unit.diagnostics.into_iter().map(|d| (path.to_path_buf(), d)));
            }
            Err(error) => {
                events::file_failed(path, error.error_code(), &error);
                result.add_error(path, error);
            }
        }
    }

    // ALTER TABLE keys may name tables defined in another file.
    for fk in &mut foreign_keys {
        let key = &mut fk.foreign_key;
        if let Some(target) = entities.iter().find(|e| {
            e.table_name == key.target_table
                && key.target_schema.as_deref().map_or(true, |s| s == e.schema)
        }) {
            key.target_entity = target.name.clone();
        }
    }
    apply_foreign_keys(&mut entities, &foreign_keys);

    let pairs = translation_pairs(&entities);
    for &(pi, ti) in &pairs.unpaired {
        let (parent, translation) = (&entities[pi], &entities[ti]);
        let merged = pairs
            .translation_of(pi)
            .map(|m| entities[m].table_name.clone())
            .unwrap_or_default();
        tracing::warn!(
            table = %translation.table_name,
            parent = %parent.name,
            merged = %merged,
            "translation table left standalone"
        );
        result.data.diagnostics.push((
            translation.source.file.clone(),
            ExtractionError::UnpairedTranslation {
                table: translation.table_name.clone(),
                parent: parent.name.clone(),
                merged,
            },
        ));
    }
    let orchestrator = PatternOrchestrator::from_config(&config.patterns);
    let merged: Vec<EntityRecord> = entities
        .par_iter()
        .enumerate()
        .filter(|(i, _)| !pairs.is_merged_translation(*i))
        .map(|(i, entity)| {
            let translation = pairs.translation_of(i).map(|ti| &entities[ti]);
            let fields = match translation {
                Some(t) => merge(entity, t),
                None => MergedFieldMap::from_entity(entity),
            };
            EntityRecord {
                detection: orchestrator.detect(entity),
                fields,
                translation_table: translation.map(|t| t.table_name.clone()),
                entity: entity.clone(),
            }
        })
        .collect();

    let min_confidence = config.patterns.effective_min_confidence();
    for record in &merged {
        let detection = &record.detection;
        if !detection.patterns.is_empty() && detection.confidence < min_confidence {
            events::low_pattern_confidence(&record.entity.name, detection.confidence, min_confidence);
            result.data.low_confidence.push(record.entity.name.clone());
        }
    }

    result.data.actions = UniversalActionMapper::new().map(&actions, &entities);
    result.data.entities = merged;

    events::batch_completed(
        units.len(),
        result.data.entities.len(),
        actions.len(),
        result.error_count(),
        result.data.omissions,
        start.elapsed().as_millis() as u64,
    );
    result
}
