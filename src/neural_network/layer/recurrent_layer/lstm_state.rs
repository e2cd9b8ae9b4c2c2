use super::*;

/// How a cell packages its recurrent state
///
/// # Variants
///
/// - `Tuple` - Cell and hidden state kept as two separate arrays (default)
/// - `Flat` - Cell and hidden state concatenated along the feature axis, cell first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StateLayout {
    #[default]
    Tuple,
    Flat,
}

/// Expected feature widths of a recurrent state, without the batch dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateSize {
    Tuple { cell: usize, hidden: usize },
    Flat(usize),
}

impl StateSize {
    /// Total number of features per batch element
    pub fn total(&self) -> usize {
        match *self {
            StateSize::Tuple { cell, hidden } => cell + hidden,
            StateSize::Flat(width) => width,
        }
    }

    /// An all-zero state for `batch` elements
    pub fn zeros(&self, batch: usize) -> LSTMState {
        match *self {
            StateSize::Tuple { cell, hidden } => LSTMState::Tuple {
                cell: Array2::zeros((batch, cell)),
                hidden: Array2::zeros((batch, hidden)),
            },
            StateSize::Flat(width) => LSTMState::Flat(Array2::zeros((batch, width))),
        }
    }
}

/// Recurrent state `(c, h)` passed from one step to the next
///
/// The cell produces a new state on every step and consumes it unchanged on the next.
/// It never keeps a copy itself; the caller threads the state through time.
///
/// # Variants
///
/// - `Tuple` - `cell` with shape (batch, units) and `hidden` with shape (batch, hidden width)
/// - `Flat` - A single (batch, units + hidden width) array, cell columns first
#[derive(Debug, Clone, PartialEq)]
pub enum LSTMState {
    Tuple {
        cell: Array2<f32>,
        hidden: Array2<f32>,
    },
    Flat(Array2<f32>),
}

impl LSTMState {
    /// Packages a cell and hidden state in the requested layout
    ///
    /// # Returns
    ///
    /// - `Ok(LSTMState)` - The packaged state
    /// - `Err(ModelError::ShapeInferenceError)` - If the two arrays have different batch sizes
    pub fn join(
        cell: Array2<f32>,
        hidden: Array2<f32>,
        layout: StateLayout,
    ) -> Result<Self, ModelError> {
        if cell.nrows() != hidden.nrows() {
            return Err(ModelError::ShapeInferenceError(format!(
                "cell state has batch size {} but hidden state has batch size {}",
                cell.nrows(),
                hidden.nrows()
            )));
        }
        match layout {
            StateLayout::Tuple => Ok(LSTMState::Tuple { cell, hidden }),
            StateLayout::Flat => Ok(LSTMState::Flat(concatenate(
                Axis(1),
                &[cell.view(), hidden.view()],
            )?)),
        }
    }

    /// Borrows the cell and hidden parts of the state
    ///
    /// # Parameters
    ///
    /// - `cell_width` - Expected width of the cell state
    /// - `hidden_width` - Expected width of the hidden state
    ///
    /// # Returns
    ///
    /// - `Ok((cell, hidden))` - Views into the state
    /// - `Err(ModelError::ShapeInferenceError)` - If the widths do not match
    pub fn split(
        &self,
        cell_width: usize,
        hidden_width: usize,
    ) -> Result<(ArrayView2<'_, f32>, ArrayView2<'_, f32>), ModelError> {
        match self {
            LSTMState::Tuple { cell, hidden } => {
                if cell.ncols() != cell_width || hidden.ncols() != hidden_width {
                    return Err(ModelError::ShapeInferenceError(format!(
                        "expected state widths ({}, {}), got ({}, {})",
                        cell_width,
                        hidden_width,
                        cell.ncols(),
                        hidden.ncols()
                    )));
                }
                if cell.nrows() != hidden.nrows() {
                    return Err(ModelError::ShapeInferenceError(format!(
                        "cell state has batch size {} but hidden state has batch size {}",
                        cell.nrows(),
                        hidden.nrows()
                    )));
                }
                Ok((cell.view(), hidden.view()))
            }
            LSTMState::Flat(state) => {
                if state.ncols() != cell_width + hidden_width {
                    return Err(ModelError::ShapeInferenceError(format!(
                        "expected flat state width {}, got {}",
                        cell_width + hidden_width,
                        state.ncols()
                    )));
                }
                Ok((
                    state.slice(s![.., ..cell_width]),
                    state.slice(s![.., cell_width..]),
                ))
            }
        }
    }

    /// Re-packages the state in another layout
    pub fn to_layout(&self, layout: StateLayout, cell_width: usize) -> Result<Self, ModelError> {
        let hidden_width = self.width().saturating_sub(cell_width);
        let (cell, hidden) = self.split(cell_width, hidden_width)?;
        LSTMState::join(cell.to_owned(), hidden.to_owned(), layout)
    }

    /// The layout this state is stored in
    pub fn layout(&self) -> StateLayout {
        match self {
            LSTMState::Tuple { .. } => StateLayout::Tuple,
            LSTMState::Flat(_) => StateLayout::Flat,
        }
    }

    /// Number of batch elements
    pub fn batch_size(&self) -> usize {
        match self {
            LSTMState::Tuple { cell, .. } => cell.nrows(),
            LSTMState::Flat(state) => state.nrows(),
        }
    }

    /// Total feature width (cell plus hidden)
    pub fn width(&self) -> usize {
        match self {
            LSTMState::Tuple { cell, hidden } => cell.ncols() + hidden.ncols(),
            LSTMState::Flat(state) => state.ncols(),
        }
    }
}
