use crate::error::ModelError;
use crate::neural_network::Tensor;
use crate::neural_network::initializer::Initializer;
use ahash::AHashMap;
use ndarray_rand::rand::SeedableRng;
use ndarray_rand::rand::rngs::StdRng;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

/// Values and random source guarded by the store's lock
struct StoreInner {
    parameters: AHashMap<String, Arc<Tensor>>,
    // creation order, used for stable summaries and saved files
    order: Vec<String>,
    rng: StdRng,
}

/// Named collection of learned parameters owned by a single cell
///
/// Parameters are created the first time they are requested and shared by every later
/// request for the same name. A later request must ask for the same shape; a different
/// shape is reported as `ModelError::ParameterShapeMismatch` and nothing is recreated.
///
/// The store can be shared between threads. Creation takes the write lock and checks
/// again for the name before initializing, so concurrent first use creates each
/// parameter exactly once. Values are handed out as `Arc<Tensor>` and readers never
/// hold the lock while computing.
///
/// # Example
/// ```rust
/// use mlstm::neural_network::{Initializer, ParameterStore};
///
/// let store = ParameterStore::new(Some(42));
/// let w = store.get_or_create("w", &[3, 4], &Initializer::default()).unwrap();
/// let again = store.get_or_create("w", &[3, 4], &Initializer::default()).unwrap();
/// assert_eq!(w, again);
/// assert_eq!(store.len(), 1);
/// ```
pub struct ParameterStore {
    inner: RwLock<StoreInner>,
    random_seed: Option<u64>,
}

impl ParameterStore {
    /// Creates an empty store
    ///
    /// # Parameters
    ///
    /// * `random_seed` - Optional seed for the generator used by initializers; `None` draws a random seed
    pub fn new(random_seed: Option<u64>) -> Self {
        let rng = match random_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::seed_from_u64(rand::random::<u64>()),
        };
        Self {
            inner: RwLock::new(StoreInner {
                parameters: AHashMap::new(),
                order: Vec::new(),
                rng,
            }),
            random_seed,
        }
    }

    get_field!(get_random_seed, random_seed, Option<u64>);

    fn read(&self) -> RwLockReadGuard<'_, StoreInner> {
        // a panic never leaves a half-inserted entry behind, so the data is still valid
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the parameter called `name`, creating it with `initializer` if it does not exist yet
    ///
    /// # Parameters
    ///
    /// - `name` - Scoped parameter name, e.g. `lstm_weight/direction`
    /// - `shape` - Shape the parameter must have
    /// - `initializer` - Used only when the parameter is created
    ///
    /// # Returns
    ///
    /// - `Ok(Arc<Tensor>)` - The stored parameter
    /// - `Err(ModelError::ParameterShapeMismatch)` - If the parameter exists with another shape
    /// - `Err(ModelError::ArgumentError)` - If the initializer rejects the shape
    pub fn get_or_create(
        &self,
        name: &str,
        shape: &[usize],
        initializer: &Initializer,
    ) -> Result<Arc<Tensor>, ModelError> {
        if let Some(existing) = self.read().parameters.get(name) {
            check_shape(name, existing, shape)?;
            return Ok(Arc::clone(existing));
        }

        let mut inner = self.write();
        if let Some(existing) = inner.parameters.get(name) {
            check_shape(name, existing, shape)?;
            return Ok(Arc::clone(existing));
        }

        let value = Arc::new(initializer.initialize(shape, &mut inner.rng)?);
        inner
            .parameters
            .insert(name.to_string(), Arc::clone(&value));
        inner.order.push(name.to_string());
        debug!(parameter = name, shape = ?shape, "created parameter");

        Ok(value)
    }

    /// Returns the parameter called `name` if it has been created
    pub fn get(&self, name: &str) -> Option<Arc<Tensor>> {
        self.read().parameters.get(name).cloned()
    }

    /// Returns whether a parameter called `name` has been created
    pub fn contains(&self, name: &str) -> bool {
        self.read().parameters.contains_key(name)
    }

    /// Overwrites the value of a parameter, creating it if it is absent
    ///
    /// An existing parameter keeps its shape: `value` must have exactly that shape.
    ///
    /// # Returns
    ///
    /// - `Ok(())` - The value was stored
    /// - `Err(ModelError::ParameterShapeMismatch)` - If the parameter exists with another shape
    pub fn assign(&self, name: &str, value: Tensor) -> Result<(), ModelError> {
        self.assign_all(vec![(name.to_string(), value)]).map(|_| ())
    }

    /// Overwrites or inserts several parameters at once
    ///
    /// Every entry is checked against the stored shapes and only then written, all under
    /// one write lock. Either every value is stored or none is.
    ///
    /// # Returns
    ///
    /// - `Ok(usize)` - Number of entries that were not in the store before
    /// - `Err(ModelError::ParameterShapeMismatch)` - If an existing parameter has another shape
    pub fn assign_all(&self, values: Vec<(String, Tensor)>) -> Result<usize, ModelError> {
        let mut inner = self.write();
        for (name, value) in &values {
            if let Some(existing) = inner.parameters.get(name) {
                check_shape(name, existing, value.shape())?;
            }
        }

        let mut created = 0;
        for (name, value) in values {
            if !inner.parameters.contains_key(&name) {
                debug!(parameter = %name, shape = ?value.shape(), "assigned new parameter");
                inner.order.push(name.clone());
                created += 1;
            }
            inner.parameters.insert(name, Arc::new(value));
        }
        Ok(created)
    }

    /// Names of all parameters in creation order
    pub fn names(&self) -> Vec<String> {
        self.read().order.clone()
    }

    /// All parameters in creation order
    pub fn snapshot(&self) -> Vec<(String, Arc<Tensor>)> {
        let inner = self.read();
        inner
            .order
            .iter()
            .filter_map(|name| {
                inner
                    .parameters
                    .get(name)
                    .map(|value| (name.clone(), Arc::clone(value)))
            })
            .collect()
    }

    /// Number of parameters created so far
    pub fn len(&self) -> usize {
        self.read().parameters.len()
    }

    /// Returns `true` if no parameter has been created yet
    pub fn is_empty(&self) -> bool {
        self.read().parameters.is_empty()
    }

    /// Total number of scalar values across all parameters
    pub fn param_count(&self) -> usize {
        self.read().parameters.values().map(|p| p.len()).sum()
    }
}

fn check_shape(name: &str, existing: &Tensor, requested: &[usize]) -> Result<(), ModelError> {
    if existing.shape() != requested {
        return Err(ModelError::ParameterShapeMismatch {
            name: name.to_string(),
            expected: requested.to_vec(),
            found: existing.shape().to_vec(),
        });
    }
    Ok(())
}
