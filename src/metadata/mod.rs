//! Sample metadata joined with a feature table.
//!
//! Observations are tree tips; samples link to the observations present in
//! them (count > 0) and carry one value per metadata column.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use log::{debug, warn};

use crate::error::{PanelError, PanelResult};

/// Category → count, iterated in ascending category order.
pub type CategoryCounts = BTreeMap<String, usize>;

/// Queries the panels run against the sample/observation table.
pub trait MetadataTable {
    /// Metadata column names, in file order.
    fn sample_categories(&self) -> Vec<String>;

    /// For every sample containing `observation`, tally its value of `column`.
    fn obs_counts_by(&self, column: &str, observation: &str) -> PanelResult<CategoryCounts>;

    /// Samples containing at least one of `observations`.
    fn samples_for_observations(&self, observations: &[String]) -> BTreeSet<String>;

    /// Tally of `column` values across `samples`.
    fn sample_value_counts(
        &self,
        samples: &BTreeSet<String>,
        column: &str,
    ) -> PanelResult<CategoryCounts>;

    /// Every distinct value of `column`, sorted ascending.
    fn unique_sample_values(&self, column: &str) -> PanelResult<Vec<String>>;

    /// Category → observations present in samples of that category.
    fn observations_by_category(
        &self,
        column: &str,
    ) -> PanelResult<BTreeMap<String, BTreeSet<String>>>;
}

/// Sample metadata as read from a QIIME-style TSV.
#[derive(Debug, Clone, Default)]
pub struct SampleMetadata {
    columns: Vec<String>,
    rows: BTreeMap<String, Vec<String>>,
}

impl SampleMetadata {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: BTreeMap::new(),
        }
    }

    /// Insert a sample row; missing trailing values are stored as empty strings.
    pub fn insert(&mut self, sample: impl Into<String>, mut values: Vec<String>) {
        values.resize(self.columns.len(), String::new());
        self.rows.insert(sample.into(), values);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn sample_count(&self) -> usize {
        self.rows.len()
    }
}

/// Observation counts per sample.
#[derive(Debug, Clone, Default)]
pub struct FeatureTable {
    samples: Vec<String>,
    observations: Vec<(String, Vec<f64>)>,
}

impl FeatureTable {
    pub fn new(samples: Vec<String>) -> Self {
        Self {
            samples,
            observations: Vec::new(),
        }
    }

    pub fn add_observation(&mut self, id: impl Into<String>, mut counts: Vec<f64>) {
        counts.resize(self.samples.len(), 0.0);
        self.observations.push((id.into(), counts));
    }

    pub fn samples(&self) -> &[String] {
        &self.samples
    }

    pub fn observation_count(&self) -> usize {
        self.observations.len()
    }
}

#[derive(Debug, Clone, Default)]
pub struct BiomTable {
    samples: Vec<String>,
    columns: Vec<String>,
    column_index: HashMap<String, usize>,
    /// `values[sample][column]`
    values: Vec<Vec<String>>,
    /// Observation ids present in each sample.
    sample_obs: Vec<BTreeSet<String>>,
    /// Sample indices containing each observation.
    obs_samples: HashMap<String, Vec<usize>>,
}

impl BiomTable {
    /// Join a feature table with sample metadata, keeping samples found in both.
    pub fn new(table: &FeatureTable, metadata: &SampleMetadata) -> Self {
        let mut biom = Self {
            columns: metadata.columns.clone(),
            column_index: metadata
                .columns
                .iter()
                .enumerate()
                .map(|(index, column)| (column.clone(), index))
                .collect(),
            ..Self::default()
        };

        let mut kept = Vec::new();
        for (table_index, sample) in table.samples.iter().enumerate() {
            match metadata.rows.get(sample) {
                Some(values) => {
                    kept.push(table_index);
                    biom.samples.push(sample.clone());
                    biom.values.push(values.clone());
                    biom.sample_obs.push(BTreeSet::new());
                }
                None => warn!("sample {sample} has no metadata row; dropping it"),
            }
        }

        for (obs_id, counts) in &table.observations {
            let mut present = Vec::new();
            for (sample_index, &table_index) in kept.iter().enumerate() {
                if counts[table_index] > 0.0 {
                    present.push(sample_index);
                    biom.sample_obs[sample_index].insert(obs_id.clone());
                }
            }
            biom.obs_samples.insert(obs_id.clone(), present);
        }

        debug!(
            "joined table: {} samples, {} observations, {} columns",
            biom.samples.len(),
            biom.obs_samples.len(),
            biom.columns.len()
        );
        biom
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    pub fn observation_count(&self) -> usize {
        self.obs_samples.len()
    }

    fn column(&self, column: &str) -> PanelResult<usize> {
        self.column_index
            .get(column)
            .copied()
            .ok_or_else(|| PanelError::InvalidColumn(column.to_string()))
    }

    fn sample_index(&self, sample: &str) -> Option<usize> {
        self.samples.iter().position(|id| id == sample)
    }
}

impl MetadataTable for BiomTable {
    fn sample_categories(&self) -> Vec<String> {
        self.columns.clone()
    }

    fn obs_counts_by(&self, column: &str, observation: &str) -> PanelResult<CategoryCounts> {
        let col = self.column(column)?;
        let mut counts = CategoryCounts::new();
        for &sample in self.obs_samples.get(observation).into_iter().flatten() {
            *counts.entry(self.values[sample][col].clone()).or_default() += 1;
        }
        Ok(counts)
    }

    fn samples_for_observations(&self, observations: &[String]) -> BTreeSet<String> {
        observations
            .iter()
            .filter_map(|obs| self.obs_samples.get(obs))
            .flatten()
            .map(|&sample| self.samples[sample].clone())
            .collect()
    }

    fn sample_value_counts(
        &self,
        samples: &BTreeSet<String>,
        column: &str,
    ) -> PanelResult<CategoryCounts> {
        let col = self.column(column)?;
        let mut counts = CategoryCounts::new();
        for sample in samples {
            if let Some(index) = self.sample_index(sample) {
                *counts.entry(self.values[index][col].clone()).or_default() += 1;
            }
        }
        Ok(counts)
    }

    fn unique_sample_values(&self, column: &str) -> PanelResult<Vec<String>> {
        let col = self.column(column)?;
        let values: BTreeSet<&String> = self.values.iter().map(|row| &row[col]).collect();
        Ok(values.into_iter().cloned().collect())
    }

    fn observations_by_category(
        &self,
        column: &str,
    ) -> PanelResult<BTreeMap<String, BTreeSet<String>>> {
        let col = self.column(column)?;
        let mut by_category: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for (sample, observations) in self.sample_obs.iter().enumerate() {
            by_category
                .entry(self.values[sample][col].clone())
                .or_default()
                .extend(observations.iter().cloned());
        }
        Ok(by_category)
    }
}

/// Table behind the panel tests.
///
/// | sample | Site | Host  | observations |
/// |--------|------|-------|--------------|
/// | s1     | gut  | human | A            |
/// | s2     | skin | human | B, D         |
/// | s3     | skin | mouse | C            |
/// | s4     | soil | none  | D            |
#[cfg(test)]
pub(crate) fn sample_table() -> BiomTable {
    let mut metadata = SampleMetadata::new(vec!["Site".to_string(), "Host".to_string()]);
    for (sample, site, host) in [
        ("s1", "gut", "human"),
        ("s2", "skin", "human"),
        ("s3", "skin", "mouse"),
        ("s4", "soil", "none"),
    ] {
        metadata.insert(sample, vec![site.to_string(), host.to_string()]);
    }

    let samples = ["s1", "s2", "s3", "s4"].map(String::from).to_vec();
    let mut table = FeatureTable::new(samples);
    table.add_observation("A", vec![3.0, 0.0, 0.0, 0.0]);
    table.add_observation("B", vec![0.0, 1.0, 0.0, 0.0]);
    table.add_observation("C", vec![0.0, 0.0, 5.0, 0.0]);
    table.add_observation("D", vec![0.0, 2.0, 0.0, 1.0]);

    BiomTable::new(&table, &metadata)
}
