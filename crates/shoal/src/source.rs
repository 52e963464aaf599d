use std::sync::Arc;

use narwhal::{Dissimilarity, SourceError};
use shoal_core::{ColumnSelection, DissimilarityModel};

use crate::error::Result;

/// A [`DissimilarityModel`] restricted to a set of active columns, seen as a layout source.
#[derive(Debug, Clone)]
pub struct ModelSource {
    model: Arc<DissimilarityModel>,
    selection: ColumnSelection,
}

impl ModelSource {
    /// `columns` of `None` keeps every column. The list is validated here, so per-pair lookups
    /// only fail for data errors such as mismatched sequence lengths.
    pub fn new(model: Arc<DissimilarityModel>, columns: Option<&[usize]>) -> Result<Self> {
        let selection = match columns {
            Some(columns) => model.select(columns)?,
            None => ColumnSelection::all(),
        };
        Ok(Self { model, selection })
    }

    pub fn model(&self) -> &Arc<DissimilarityModel> {
        &self.model
    }

    pub fn selection(&self) -> &ColumnSelection {
        &self.selection
    }
}

impl Dissimilarity for ModelSource {
    fn len(&self) -> usize {
        self.model.len()
    }

    fn dissimilarity(&self, i: usize, j: usize) -> std::result::Result<f64, SourceError> {
        Ok(self.model.distance_with(i, j, &self.selection)?)
    }
}
