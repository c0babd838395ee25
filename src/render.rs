// src/render.rs
//! Растровое превью острова
//!
//! Слои рисуются по порядку:
//! 1. фон цвета океана;
//! 2. регионы цветом биома по шумному контуру ([`NoisyEdges::region_outline`]);
//! 3. реки, толщина растёт с расходом;
//! 4. дороги (прямые линии-заглушки красным);
//! 5. поселения, радиус по размеру.
//!
//! Координаты карты переводятся в пиксели множителем `scale`.

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut, draw_polygon_mut};
use imageproc::point::Point as PixelPoint;

use crate::biome::Biome;
use crate::graph::Point;
use crate::map::MapData;
use crate::noisy_edges::NoisyEdges;
use crate::roads::RoadNetwork;
use crate::settlement::{Settlement, SizeTier};

const RIVER_COLOR: Rgb<u8> = Rgb([34, 85, 136]);
const ROAD_COLOR: Rgb<u8> = Rgb([110, 80, 50]);
const STRAIGHT_ROAD_COLOR: Rgb<u8> = Rgb([200, 40, 40]);
const SETTLEMENT_COLOR: Rgb<u8> = Rgb([20, 20, 20]);

/// Готовое изображение карты
#[derive(Debug, Clone)]
pub struct MapImage {
    pub width: u32,
    pub height: u32,
    scale: f64,
    buffer: RgbImage,
}

impl MapImage {
    /// Рисует биомы и реки карты
    #[must_use]
    pub fn render(map: &MapData, scale: f64) -> Self {
        let config = map.config();
        let width = ((config.width * scale).ceil() as u32).max(1);
        let height = ((config.height * scale).ceil() as u32).max(1);
        let buffer = RgbImage::from_pixel(width, height, Rgb(Biome::Ocean.to_rgb()));

        let mut image = Self {
            width,
            height,
            scale,
            buffer,
        };
        image.draw_regions(map);
        image.draw_rivers(map);
        image
    }

    fn to_pixel(&self, p: Point) -> (f32, f32) {
        ((p.x * self.scale) as f32, (p.y * self.scale) as f32)
    }

    fn draw_regions(&mut self, map: &MapData) {
        let graph = map.graph();
        let noisy: &NoisyEdges = map.noisy_edges();
        for region in &graph.regions {
            if region.biome == Biome::Ocean {
                continue;
            }
            let outline = noisy.region_outline(graph, region.index);
            let polygon = self.polygon(&outline);
            if polygon.len() < 3 {
                continue;
            }
            draw_polygon_mut(&mut self.buffer, &polygon, Rgb(region.biome.to_rgb()));
        }
    }

    /// Пиксельный многоугольник без повторов подряд и без замыкающей точки
    fn polygon(&self, outline: &[Point]) -> Vec<PixelPoint<i32>> {
        let mut polygon: Vec<PixelPoint<i32>> = Vec::with_capacity(outline.len());
        for &p in outline {
            let (x, y) = self.to_pixel(p);
            let pixel = PixelPoint::new(x.round() as i32, y.round() as i32);
            if polygon.last() != Some(&pixel) {
                polygon.push(pixel);
            }
        }
        while polygon.len() > 1 && polygon.first() == polygon.last() {
            polygon.pop();
        }
        polygon
    }

    fn draw_rivers(&mut self, map: &MapData) {
        let graph = map.graph();
        for edge in graph.edges.iter().filter(|e| e.river > 0) {
            let Some((v0, v1)) = edge.corners() else { continue };
            let a = self.to_pixel(graph.corners[v0].point);
            let b = self.to_pixel(graph.corners[v1].point);
            let width = (edge.river as f32).sqrt().clamp(1.0, 4.0) as i32;
            self.thick_line(a, b, width, RIVER_COLOR);
        }
    }

    fn thick_line(&mut self, a: (f32, f32), b: (f32, f32), width: i32, color: Rgb<u8>) {
        let half = width / 2;
        for dx in -half..=half {
            for dy in -half..=half {
                let (ox, oy) = (dx as f32, dy as f32);
                draw_line_segment_mut(&mut self.buffer, (a.0 + ox, a.1 + oy), (b.0 + ox, b.1 + oy), color);
            }
        }
    }

    /// Рисует дороги
    pub fn draw_roads(&mut self, roads: &RoadNetwork) {
        for road in &roads.roads {
            let color = if road.straight_line {
                STRAIGHT_ROAD_COLOR
            } else {
                ROAD_COLOR
            };
            for w in road.path.windows(2) {
                let (a, b) = (self.to_pixel(w[0]), self.to_pixel(w[1]));
                draw_line_segment_mut(&mut self.buffer, a, b, color);
            }
        }
    }

    /// Рисует поселения кружками
    pub fn draw_settlements(&mut self, settlements: &[Settlement]) {
        for settlement in settlements {
            let radius = match settlement.size {
                SizeTier::Large => 5.0,
                SizeTier::Medium => 4.0,
                SizeTier::Small => 3.0,
            };
            let radius = ((radius * self.scale).round() as i32).max(1);
            let (x, y) = self.to_pixel(settlement.point);
            draw_filled_circle_mut(
                &mut self.buffer,
                (x.round() as i32, y.round() as i32),
                radius,
                SETTLEMENT_COLOR,
            );
        }
    }

    /// Цвет пикселя, `None` за пределами изображения
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        (x < self.width && y < self.height).then(|| self.buffer.get_pixel(x, y).0)
    }

    pub fn save_as_png(&self, path: &str) -> Result<(), Box<dyn std::error::Error>> {
        self.buffer.save(path)?;
        Ok(())
    }
}
