/// Active columns for a distance query.
///
/// Build one with [`crate::DissimilarityModel::select`], which validates indices against the
/// collection; [`ColumnSelection::all`] includes every column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnSelection {
    columns: Option<Vec<usize>>,
    mask: Vec<bool>,
}

impl ColumnSelection {
    pub fn all() -> Self {
        Self::default()
    }

    /// `columns` must already be sorted, deduplicated and in range for `width` columns.
    pub(crate) fn only(columns: Vec<usize>, width: usize) -> Self {
        let mut mask = vec![false; width];
        for &c in &columns {
            mask[c] = true;
        }
        Self {
            columns: Some(columns),
            mask,
        }
    }

    pub fn is_all(&self) -> bool {
        self.columns.is_none()
    }

    /// Selected column indices, or `None` for all columns.
    pub fn columns(&self) -> Option<&[usize]> {
        self.columns.as_deref()
    }

    #[inline]
    pub fn includes(&self, column: usize) -> bool {
        match self.columns {
            None => true,
            Some(_) => self.mask.get(column).copied().unwrap_or(false),
        }
    }
}
