pub mod biome;
pub mod config;
pub mod error;
pub mod graph;
pub mod map;
pub mod noisy_edges;
pub mod render;
pub mod rng;
pub mod roads;
pub mod settlement;
pub mod terrain;

pub use biome::Biome;
pub use config::{GeneratorParams, MapConfig, PlacementRule, RuleCategory, SettlementConfig};
pub use error::{ConfigError, MapGenError};
pub use graph::{Corner, Edge, MapGraph, Point, Region};
pub use map::{MapData, MapSummary, generate};
pub use render::MapImage;
pub use roads::{RoadKind, RoadNetwork, RoadSegment, build_roads};
pub use settlement::{
    Settlement, SettlementKind, SettlementResult, SettlementStats, SizeTier, place_settlements,
};
