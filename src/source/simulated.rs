/*!
 * Synthetic hotspots for when there is no real data at all.
 *
 * The numbers are typical of the winter crop burning season, 40 to 60 detections with a fire
 * power of 10 to 150 MW each, spread uniformly over the region.
 */
use crate::{
    error::TierFailure,
    geo::{BoundingBox, Coord},
    hotspot::{ConfidenceLevel, FireHotspot, SourceTier},
    snapshot::round_to,
};
use rand::{seq::SliceRandom, Rng};
use std::ops::RangeInclusive;

/// Fire power that maps to an intensity of 1.0.
const FRP_SCALE: f64 = 150.0;

/// The shape of a simulated batch.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationParams {
    /// How many hotspots to create.
    pub count: RangeInclusive<usize>,
    /// Fire radiative power range in megawatts.
    pub frp_mw: RangeInclusive<f64>,
    /// Brightness temperature range in Kelvin.
    pub brightness_k: RangeInclusive<f64>,
    /// Seed for the random number generator, so runs can be repeated.
    pub seed: Option<u64>,
}

impl Default for SimulationParams {
    fn default() -> Self {
        SimulationParams {
            count: 40..=60,
            frp_mw: 10.5..=150.0,
            brightness_k: 300.0..=380.0,
            seed: None,
        }
    }
}

impl SimulationParams {
    fn check(&self, region: &BoundingBox) -> Result<(), TierFailure> {
        let in_world = region.ll.lat >= -90.0
            && region.ur.lat <= 90.0
            && region.ll.lon >= -180.0
            && region.ur.lon <= 180.0;

        if !region.is_valid() || !in_world {
            return Err(TierFailure::InvalidRegion(format!("bad bounding box {}", region)));
        }

        if self.count.is_empty() || *self.count.start() == 0 {
            return Err(TierFailure::InvalidRegion(format!(
                "hotspot count range {:?} is empty",
                self.count
            )));
        }

        let frp_ok = self.frp_mw.start().is_finite()
            && self.frp_mw.end().is_finite()
            && *self.frp_mw.start() >= 0.0
            && !self.frp_mw.is_empty();
        let brightness_ok = self.brightness_k.start().is_finite()
            && self.brightness_k.end().is_finite()
            && !self.brightness_k.is_empty();

        if !frp_ok || !brightness_ok {
            return Err(TierFailure::InvalidRegion(format!(
                "bad fire power {:?} or brightness {:?} range",
                self.frp_mw, self.brightness_k
            )));
        }

        Ok(())
    }
}

/**
 * Generate a synthetic batch of hotspots inside `region`.
 *
 * Positions are rounded to 4 decimal places and fire power to 1, like the real feed.
 *
 * #Returns
 * At least one hotspot, or an error if the parameters or region can't produce any.
 */
pub fn generate<R: Rng + ?Sized>(
    params: &SimulationParams,
    region: &BoundingBox,
    rng: &mut R,
) -> Result<Vec<FireHotspot>, TierFailure> {
    params.check(region)?;

    let count = rng.gen_range(params.count.clone());
    let levels = [ConfidenceLevel::Nominal, ConfidenceLevel::High];

    let hotspots = (0..count)
        .map(|id| {
            let lat = round_to(rng.gen_range(region.ll.lat..=region.ur.lat), 4)
                .clamp(region.ll.lat, region.ur.lat);
            let lon = round_to(rng.gen_range(region.ll.lon..=region.ur.lon), 4)
                .clamp(region.ll.lon, region.ur.lon);
            let frp = round_to(rng.gen_range(params.frp_mw.clone()), 1)
                .clamp(*params.frp_mw.start(), *params.frp_mw.end());
            let brightness = round_to(rng.gen_range(params.brightness_k.clone()), 1);
            let confidence = levels
                .choose(rng)
                .copied()
                .unwrap_or(ConfidenceLevel::Nominal);

            let mut hotspot = FireHotspot::new(
                id as u32,
                Coord::new(lat, lon),
                frp,
                confidence.percent(),
                SourceTier::Simulated,
            );
            hotspot.brightness = Some(brightness);
            hotspot.intensity = Some(frp / FRP_SCALE);
            hotspot
        })
        .collect();

    Ok(hotspots)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::source::DEFAULT_REGION;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_batch_is_plausible() {
        let mut rng = StdRng::seed_from_u64(17);
        let params = SimulationParams::default();

        for _ in 0..20 {
            let hotspots = generate(&params, &DEFAULT_REGION, &mut rng).unwrap();

            assert!((40..=60).contains(&hotspots.len()));
            for (i, h) in hotspots.iter().enumerate() {
                assert_eq!(h.id as usize, i);
                assert!(DEFAULT_REGION.contains(h.position));
                assert!((10.5..=150.0).contains(&h.frp));
                assert!(h.confidence == 70 || h.confidence == 90);
                assert_eq!(h.source_tier, SourceTier::Simulated);
                assert!(h.is_well_formed());
            }
        }
    }

    #[test]
    fn test_same_seed_same_batch() {
        let params = SimulationParams::default();

        let a = generate(&params, &DEFAULT_REGION, &mut StdRng::seed_from_u64(5)).unwrap();
        let b = generate(&params, &DEFAULT_REGION, &mut StdRng::seed_from_u64(5)).unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_inputs() {
        let mut rng = StdRng::seed_from_u64(1);
        let params = SimulationParams::default();

        let backwards = BoundingBox::new(32.0, 75.0, 30.0, 76.0);
        assert!(matches!(
            generate(&params, &backwards, &mut rng),
            Err(TierFailure::InvalidRegion(_))
        ));

        let no_fires = SimulationParams {
            count: 0..=0,
            ..SimulationParams::default()
        };
        assert!(generate(&no_fires, &DEFAULT_REGION, &mut rng).is_err());
    }
}
