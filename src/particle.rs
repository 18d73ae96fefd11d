//! Star state and the owned, resizable star field.

/// Half-extent of the x/y spawn box.
pub const SPAWN_XY: f32 = 1000.0;
/// Far edge of the z spawn range (exclusive).
pub const SPAWN_DEPTH: f32 = 2000.0;
/// Stars at or behind this depth have passed the camera and are respawned.
pub const RECYCLE_Z: f32 = -200.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub base_size: f32,
    pub hue: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeRange {
    pub min: f32,
    pub max: f32,
}

impl SizeRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }
}

/// Hue sampling range in degrees. `min == max` collapses to a single hue.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HueRange {
    pub min: f32,
    pub max: f32,
}

impl HueRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub const fn single(hue: f32) -> Self {
        Self { min: hue, max: hue }
    }
}

fn uniform(rng: &mut fastrand::Rng, lo: f32, hi: f32) -> f32 {
    if hi <= lo {
        return lo;
    }
    lo + rng.f32() * (hi - lo)
}

impl Particle {
    pub fn sample(rng: &mut fastrand::Rng, size: SizeRange, hue: HueRange) -> Self {
        Self {
            x: uniform(rng, -SPAWN_XY, SPAWN_XY),
            y: uniform(rng, -SPAWN_XY, SPAWN_XY),
            z: uniform(rng, 0.0, SPAWN_DEPTH),
            base_size: uniform(rng, size.min, size.max),
            hue: uniform(rng, hue.min, hue.max),
        }
    }
}

/// Ordered particle arena. Growing appends, shrinking truncates the tail, and
/// kept particles are never resampled by either.
pub struct ParticleField {
    particles: Vec<Particle>,
    size: SizeRange,
    hue: HueRange,
    rng: fastrand::Rng,
}

impl ParticleField {
    pub fn create(n: usize, size: SizeRange, hue: HueRange) -> Self {
        Self::with_rng(n, size, hue, fastrand::Rng::new())
    }

    /// Deterministic field for tests and the headless calibrator.
    pub fn with_seed(n: usize, size: SizeRange, hue: HueRange, seed: u64) -> Self {
        Self::with_rng(n, size, hue, fastrand::Rng::with_seed(seed))
    }

    fn with_rng(n: usize, size: SizeRange, hue: HueRange, mut rng: fastrand::Rng) -> Self {
        let particles = (0..n).map(|_| Particle::sample(&mut rng, size, hue)).collect();
        Self {
            particles,
            size,
            hue,
            rng,
        }
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn size_range(&self) -> SizeRange {
        self.size
    }

    pub fn hue_range(&self) -> HueRange {
        self.hue
    }

    /// Move every star `distance` units towards the camera and respawn the
    /// ones that crossed `RECYCLE_Z`.
    pub fn advance(&mut self, distance: f32) {
        let (size, hue) = (self.size, self.hue);
        for p in &mut self.particles {
            p.z -= distance;
            if p.z <= RECYCLE_Z {
                *p = Particle::sample(&mut self.rng, size, hue);
            }
        }
    }

    pub fn resize(&mut self, new_count: usize) {
        let len = self.particles.len();
        if new_count > len {
            let (size, hue) = (self.size, self.hue);
            self.particles.reserve(new_count - len);
            for _ in len..new_count {
                self.particles.push(Particle::sample(&mut self.rng, size, hue));
            }
        } else {
            self.particles.truncate(new_count);
        }
    }

    /// Resample `base_size` and/or `hue` for every star, keeping positions.
    pub fn restyle(&mut self, size: Option<SizeRange>, hue: Option<HueRange>) {
        if let Some(size) = size {
            self.size = size;
        }
        if let Some(hue) = hue {
            self.hue = hue;
        }
        if size.is_none() && hue.is_none() {
            return;
        }
        for p in &mut self.particles {
            if let Some(size) = size {
                p.base_size = uniform(&mut self.rng, size.min, size.max);
            }
            if let Some(hue) = hue {
                p.hue = uniform(&mut self.rng, hue.min, hue.max);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIZE: SizeRange = SizeRange::new(0.5, 2.0);
    const HUE: HueRange = HueRange::new(200.0, 260.0);

    fn in_spawn_bounds(p: &Particle) -> bool {
        (-SPAWN_XY..SPAWN_XY).contains(&p.x)
            && (-SPAWN_XY..SPAWN_XY).contains(&p.y)
            && (0.0..SPAWN_DEPTH).contains(&p.z)
    }

    #[test]
    fn create_samples_within_ranges() {
        let field = ParticleField::with_seed(500, SIZE, HUE, 7);
        assert_eq!(field.len(), 500);
        for p in field.particles() {
            assert!(in_spawn_bounds(p));
            assert!((SIZE.min..=SIZE.max).contains(&p.base_size));
            assert!((HUE.min..=HUE.max).contains(&p.hue));
        }
    }

    #[test]
    fn grow_then_shrink_restores_prefix() {
        let mut field = ParticleField::with_seed(200, SIZE, HUE, 11);
        let before = field.particles().to_vec();
        field.resize(250);
        assert_eq!(field.len(), 250);
        assert_eq!(&field.particles()[..200], &before[..]);
        field.resize(200);
        assert_eq!(field.particles(), &before[..]);
    }

    #[test]
    fn advance_respawns_stars_behind_camera() {
        let mut field = ParticleField::with_seed(300, SIZE, HUE, 3);
        // Far enough that every star crosses the recycle plane.
        field.advance(SPAWN_DEPTH + 500.0);
        for p in field.particles() {
            assert!(p.z > RECYCLE_Z);
            assert!(in_spawn_bounds(p));
        }
    }

    #[test]
    fn advance_moves_surviving_stars() {
        let mut field = ParticleField::with_seed(50, SIZE, HUE, 5);
        let before = field.particles().to_vec();
        field.advance(1.0);
        for (old, new) in before.iter().zip(field.particles()) {
            if old.z - 1.0 > RECYCLE_Z {
                assert_eq!(new.z, old.z - 1.0);
                assert_eq!(new.x, old.x);
            }
        }
    }

    #[test]
    fn restyle_keeps_positions() {
        let mut field = ParticleField::with_seed(100, SIZE, HUE, 9);
        let before = field.particles().to_vec();
        field.restyle(None, Some(HueRange::single(0.0)));
        for (old, new) in before.iter().zip(field.particles()) {
            assert_eq!((old.x, old.y, old.z), (new.x, new.y, new.z));
            assert_eq!(old.base_size, new.base_size);
            assert_eq!(new.hue, 0.0);
        }
        assert_eq!(field.hue_range(), HueRange::single(0.0));
    }

    #[test]
    fn restyle_updates_ranges_used_for_growth() {
        let mut field = ParticleField::with_seed(10, SIZE, HUE, 1);
        field.restyle(Some(SizeRange::new(3.0, 3.0)), None);
        field.resize(20);
        assert!(field.particles().iter().all(|p| p.base_size == 3.0));
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_resize_keeps_surviving_prefix(start in 0usize..400, target in 0usize..400, seed in any::<u64>()) {
                let mut field = ParticleField::with_seed(start, SIZE, HUE, seed);
                let before = field.particles().to_vec();
                field.resize(target);
                prop_assert_eq!(field.len(), target);
                let kept = start.min(target);
                prop_assert_eq!(&field.particles()[..kept], &before[..kept]);
                prop_assert!(field.particles()[kept..].iter().all(in_spawn_bounds));
            }
        }
    }
}
