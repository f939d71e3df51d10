//! Shipment prices for checkout groups.

use std::sync::Arc;

use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::config::ShipmentConfig;
use crate::entities::shipment_method;
use crate::errors::ServiceError;
use crate::services::rate_quote::{RateQuote, RateQuoteClient, RateQuoteRequest};

const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

#[cfg_attr(test, mockall::automock)]
pub trait DistanceCalculator: Send + Sync {
    /// Distance between two points in kilometers
    fn distance_km(&self, from: GeoPoint, to: GeoPoint) -> f64;
}

/// Great-circle distance on a spherical earth
#[derive(Debug, Clone, Copy, Default)]
pub struct HaversineDistance;

impl DistanceCalculator for HaversineDistance {
    fn distance_km(&self, from: GeoPoint, to: GeoPoint) -> f64 {
        let lat1 = from.latitude.to_radians();
        let lat2 = to.latitude.to_radians();
        let d_lat = lat2 - lat1;
        let d_lon = (to.longitude - from.longitude).to_radians();

        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
    }
}

/// Price of an in-house delivery.
///
/// The distance is rounded to whole kilometers and raised to `min_km`.
/// A price above `max_price` is returned as zero.
pub fn in_house_price(distance_km: f64, price_per_km: i64, min_km: i64, max_price: i64) -> i64 {
    let km = (distance_km.round() as i64).max(min_km);
    let price = km.saturating_mul(price_per_km);
    if price > max_price {
        0
    } else {
        price
    }
}

/// Cost of the first quote whose ETD mentions `estimated_days`, zero when
/// none does.
pub fn pick_quote(quotes: &[RateQuote], estimated_days: Option<i32>) -> i64 {
    let Some(days) = estimated_days else {
        return 0;
    };
    let days = days.to_string();
    quotes
        .iter()
        .find(|quote| quote.etd.contains(&days))
        .map(|quote| quote.cost)
        .unwrap_or(0)
}

/// Everything needed to price one pharmacy group
#[derive(Debug, Clone)]
pub struct ShipmentQuoteRequest {
    pub method: shipment_method::Model,
    pub origin: GeoPoint,
    pub origin_city_id: i32,
    pub destination: GeoPoint,
    pub destination_city_id: i32,
    /// Grams
    pub weight: i64,
}

#[derive(Clone)]
pub struct ShipmentPricer {
    distance: Arc<dyn DistanceCalculator>,
    rates: Arc<dyn RateQuoteClient>,
    config: ShipmentConfig,
}

impl ShipmentPricer {
    pub fn new(
        distance: Arc<dyn DistanceCalculator>,
        rates: Arc<dyn RateQuoteClient>,
        config: ShipmentConfig,
    ) -> Self {
        Self {
            distance,
            rates,
            config,
        }
    }

    pub fn is_in_house(&self, method_id: i32) -> bool {
        method_id <= self.config.in_house_max_method_id
    }

    #[instrument(skip(self, request), fields(method_id = request.method.id))]
    pub async fn price(&self, request: &ShipmentQuoteRequest) -> Result<i64, ServiceError> {
        if self.is_in_house(request.method.id) {
            let km = self
                .distance
                .distance_km(request.origin, request.destination);
            let price = in_house_price(
                km,
                request.method.price_per_km,
                self.config.min_distance_km,
                self.config.max_price,
            );
            debug!(distance_km = km, price, "In-house shipment priced");
            return Ok(price);
        }

        let quotes = self
            .rates
            .quote(&RateQuoteRequest {
                origin_city_id: request.origin_city_id,
                destination_city_id: request.destination_city_id,
                weight: request.weight,
                courier: request.method.courier_name.clone(),
            })
            .await?;

        let cost = pick_quote(&quotes, request.method.estimated_days);
        if cost == 0 {
            warn!(
                courier = %request.method.courier_name,
                estimated_days = ?request.method.estimated_days,
                "No courier quote matches the shipment method"
            );
            return Err(ServiceError::InvalidShipmentMethods(format!(
                "{} has no quote for method {}",
                request.method.courier_name, request.method.id
            )));
        }
        Ok(cost)
    }

    /// Prices every request concurrently; the first failure fails the batch.
    pub async fn price_all(
        &self,
        requests: &[ShipmentQuoteRequest],
    ) -> Result<Vec<i64>, ServiceError> {
        try_join_all(requests.iter().map(|request| self.price(request))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use async_trait::async_trait;

    struct CannedRates(Vec<RateQuote>);

    #[async_trait]
    impl RateQuoteClient for CannedRates {
        async fn quote(&self, _: &RateQuoteRequest) -> Result<Vec<RateQuote>, ServiceError> {
            Ok(self.0.clone())
        }
    }

    fn method(id: i32, price_per_km: i64, estimated_days: Option<i32>) -> shipment_method::Model {
        shipment_method::Model {
            id,
            name: format!("method {}", id),
            courier_name: "jne".to_string(),
            price_per_km,
            estimated_days,
        }
    }

    fn request(method: shipment_method::Model) -> ShipmentQuoteRequest {
        ShipmentQuoteRequest {
            method,
            origin: GeoPoint::new(-6.2, 106.8),
            origin_city_id: 151,
            destination: GeoPoint::new(-6.3, 106.9),
            destination_city_id: 152,
            weight: 500,
        }
    }

    fn quote(cost: i64, etd: &str) -> RateQuote {
        RateQuote {
            service: "REG".to_string(),
            cost,
            etd: etd.to_string(),
        }
    }

    #[test]
    fn in_house_price_rounds_and_applies_floor() {
        assert_eq!(in_house_price(2.6, 500, 1, 1_000_000), 1500);
        assert_eq!(in_house_price(0.2, 500, 1, 1_000_000), 500);
        assert_eq!(in_house_price(0.2, 500, 0, 1_000_000), 0);
    }

    #[test]
    fn in_house_price_above_cap_is_zero() {
        assert_eq!(in_house_price(10.0, 200, 1, 2000), 2000);
        assert_eq!(in_house_price(11.0, 200, 1, 2000), 0);
    }

    #[test]
    fn pick_quote_matches_estimated_days() {
        let quotes = vec![quote(18000, "4-5"), quote(21000, "2-3")];
        assert_eq!(pick_quote(&quotes, Some(3)), 21000);
        assert_eq!(pick_quote(&quotes, Some(7)), 0);
        assert_eq!(pick_quote(&quotes, None), 0);
    }

    #[test]
    fn haversine_is_zero_for_the_same_point() {
        let p = GeoPoint::new(-6.2, 106.8);
        assert!(HaversineDistance.distance_km(p, p).abs() < 1e-9);
    }

    #[test]
    fn haversine_one_degree_of_latitude() {
        let km = HaversineDistance.distance_km(GeoPoint::new(0.0, 0.0), GeoPoint::new(1.0, 0.0));
        assert!((km - 111.19).abs() < 0.1, "got {}", km);
    }

    #[tokio::test]
    async fn in_house_methods_use_the_distance_calculator() {
        let mut distance = MockDistanceCalculator::new();
        distance.expect_distance_km().times(1).return_const(3.0);
        let pricer = ShipmentPricer::new(
            Arc::new(distance),
            Arc::new(CannedRates(Vec::new())),
            ShipmentConfig::default(),
        );

        let price = pricer.price(&request(method(1, 500, None))).await.unwrap();
        assert_eq!(price, 1500);
    }

    #[tokio::test]
    async fn third_party_without_matching_quote_is_rejected() {
        let mut distance = MockDistanceCalculator::new();
        distance.expect_distance_km().never();
        let pricer = ShipmentPricer::new(
            Arc::new(distance),
            Arc::new(CannedRates(vec![quote(18000, "4-5")])),
            ShipmentConfig::default(),
        );

        let result = pricer.price(&request(method(3, 0, Some(2)))).await;
        assert_matches!(result, Err(ServiceError::InvalidShipmentMethods(_)));
    }

    #[tokio::test]
    async fn price_all_keeps_request_order() {
        let mut distance = MockDistanceCalculator::new();
        distance.expect_distance_km().return_const(2.0);
        let pricer = ShipmentPricer::new(
            Arc::new(distance),
            Arc::new(CannedRates(vec![quote(21000, "2-3")])),
            ShipmentConfig::default(),
        );

        let prices = pricer
            .price_all(&[
                request(method(3, 0, Some(2))),
                request(method(1, 700, None)),
            ])
            .await
            .unwrap();
        assert_eq!(prices, vec![21000, 1400]);
    }
}
