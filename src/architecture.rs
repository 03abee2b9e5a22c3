//! Architecture configuration
//!
//! Describes a layer graph in JSON so topologies can be changed without code
//! changes. Layers are declared by name; connections refer to those names.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::{NetworkError, Result};
use crate::matrix::Matrix;
use crate::network::{ActivationStrategy, Network, NetworkBuilder};
use crate::utils::SimpleRng;

/// One layer of the graph.
///
/// `kind` is `"trainable"` (default) or `"constant"`. Constant layers emit
/// `value`, which defaults to `1.0` (a bias unit).
///
/// ```json
/// { "name": "bias", "units": 1, "kind": "constant", "value": 1.0 }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct LayerConfig {
    pub name: String,
    pub units: usize,
    pub kind: Option<String>,
    pub value: Option<f32>,
}

impl LayerConfig {
    /// Activation strategy described by `kind` and `value`.
    pub fn strategy(&self) -> Result<ActivationStrategy> {
        let kind = self.kind.as_deref().unwrap_or("trainable").to_lowercase();
        match kind.as_str() {
            "trainable" => Ok(ActivationStrategy::Trainable),
            "constant" => Ok(ActivationStrategy::Constant {
                value: self.value.unwrap_or(1.0),
            }),
            _ => Err(NetworkError::InvalidArchitecture(format!(
                "layer '{}': invalid kind '{}', must be one of: trainable, constant",
                self.name, kind
            ))),
        }
    }
}

/// A connection `from -> to`. Without explicit `weights` (row-major,
/// `units(to) x units(from)`) the weights are drawn Xavier-uniform.
///
/// ```json
/// { "from": "hidden", "to": "output", "weights": [0.5, -0.5, 0.25] }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionConfig {
    pub from: String,
    pub to: String,
    pub weights: Option<Vec<f32>>,
}

/// Complete graph description.
///
/// # Example
///
/// ```json
/// {
///   "input": "input",
///   "output": "output",
///   "layers": [
///     { "name": "input", "units": 2 },
///     { "name": "bias", "units": 1, "kind": "constant" },
///     { "name": "output", "units": 1 }
///   ],
///   "connections": [
///     { "from": "input", "to": "output" },
///     { "from": "bias", "to": "output" }
///   ]
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ArchitectureConfig {
    pub input: String,
    pub output: String,
    pub layers: Vec<LayerConfig>,
    #[serde(default)]
    pub connections: Vec<ConnectionConfig>,
}

/// Loads and validates an architecture from a JSON file.
///
/// # Examples
///
/// ```no_run
/// use rust_neural_backprop::architecture::load_architecture;
///
/// let arch = load_architecture("config/architectures/xor_bias.json").unwrap();
/// assert!(!arch.layers.is_empty());
/// ```
pub fn load_architecture(path: impl AsRef<Path>) -> Result<ArchitectureConfig> {
    let contents = fs::read_to_string(path)?;
    let config: ArchitectureConfig = serde_json::from_str(&contents)?;
    validate_architecture(&config)?;
    Ok(config)
}

/// Structural checks that do not need a built graph.
pub fn validate_architecture(config: &ArchitectureConfig) -> Result<()> {
    if config.layers.is_empty() {
        return Err(NetworkError::InvalidArchitecture(
            "architecture must contain at least one layer".to_string(),
        ));
    }

    for (index, layer) in config.layers.iter().enumerate() {
        if layer.units == 0 {
            return Err(NetworkError::InvalidArchitecture(format!(
                "layer {} ('{}'): units must be greater than 0",
                index, layer.name
            )));
        }
        layer.strategy()?;
    }

    let declared = |name: &str| config.layers.iter().any(|l| l.name == name);
    for name in [&config.input, &config.output] {
        if !declared(name) {
            return Err(NetworkError::UnknownLayer(name.clone()));
        }
    }
    for (index, connection) in config.connections.iter().enumerate() {
        for name in [&connection.from, &connection.to] {
            if !declared(name) {
                return Err(NetworkError::InvalidArchitecture(format!(
                    "connection {}: unknown layer '{}'",
                    index, name
                )));
            }
        }
    }

    Ok(())
}

/// Builds a network from `config`, drawing missing weights from `rng`.
///
/// # Errors
///
/// Any validation error of [`validate_architecture`] or of
/// [`NetworkBuilder::build`].
///
/// # Examples
///
/// ```no_run
/// use rust_neural_backprop::architecture::{build_network, load_architecture};
/// use rust_neural_backprop::utils::SimpleRng;
///
/// let config = load_architecture("config/architectures/xor_bias.json").unwrap();
/// let mut rng = SimpleRng::new(42);
/// let network = build_network(&config, &mut rng).unwrap();
/// assert_eq!(network.layers().len(), config.layers.len());
/// ```
pub fn build_network(config: &ArchitectureConfig, rng: &mut SimpleRng) -> Result<Network> {
    validate_architecture(config)?;

    let mut builder = NetworkBuilder::new();
    for layer in &config.layers {
        builder.add_layer(layer.name.clone(), layer.units, layer.strategy()?)?;
    }

    for connection in &config.connections {
        let from = builder.layer_id(&connection.from)?;
        let to = builder.layer_id(&connection.to)?;
        match &connection.weights {
            Some(weights) => {
                let rows = units(config, &connection.to);
                let columns = units(config, &connection.from);
                builder.connect(from, to, Matrix::from_vec(rows, columns, weights.clone())?)?;
            }
            None => {
                builder.connect_xavier(from, to, rng)?;
            }
        }
    }

    let input = builder.layer_id(&config.input)?;
    let output = builder.layer_id(&config.output)?;
    let network = builder.build(input, output)?;
    debug!(
        layers = network.layers().len(),
        parameters = network.parameter_count(),
        "built network from architecture"
    );
    Ok(network)
}

fn units(config: &ArchitectureConfig, name: &str) -> usize {
    config
        .layers
        .iter()
        .find(|l| l.name == name)
        .map_or(0, |l| l.units)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> ArchitectureConfig {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_kind_defaults_to_trainable() {
        let layer: LayerConfig = serde_json::from_str(r#"{"name": "h", "units": 3}"#).unwrap();
        assert_eq!(layer.strategy().unwrap(), ActivationStrategy::Trainable);
    }

    #[test]
    fn test_constant_kind_case_insensitive() {
        let layer: LayerConfig =
            serde_json::from_str(r#"{"name": "b", "units": 1, "kind": "Constant", "value": 0.5}"#)
                .unwrap();
        assert_eq!(
            layer.strategy().unwrap(),
            ActivationStrategy::Constant { value: 0.5 }
        );
    }

    #[test]
    fn test_unknown_connection_endpoint() {
        let config = parse(
            r#"{
                "input": "a", "output": "b",
                "layers": [{"name": "a", "units": 1}, {"name": "b", "units": 1}],
                "connections": [{"from": "a", "to": "missing"}]
            }"#,
        );
        let err = validate_architecture(&config).unwrap_err();
        assert!(matches!(err, NetworkError::InvalidArchitecture(_)));
    }

    #[test]
    fn test_explicit_weights_are_used() {
        let config = parse(
            r#"{
                "input": "a", "output": "b",
                "layers": [{"name": "a", "units": 2}, {"name": "b", "units": 1}],
                "connections": [{"from": "a", "to": "b", "weights": [0.5, -0.5]}]
            }"#,
        );
        let network = build_network(&config, &mut SimpleRng::new(1)).unwrap();
        assert_eq!(network.connections()[0].weights().elements(), &[0.5, -0.5]);
    }
}
