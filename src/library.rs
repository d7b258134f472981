use crate::circuit::Circuit;
use crate::rng::SeededRng;
use crate::vector::MapPoint;

pub const MAP_WIDTH: i32 = 16_000;
pub const MAP_HEIGHT: i32 = 9_000;

// Layouts recorded from earlier races, checkpoint 0 first.
const RECORDED_CIRCUITS: &[&[(i32, i32)]] = &[
    &[(12460, 1350), (10540, 5980), (3580, 5180), (13580, 7600)],
    &[(3600, 5280), (13840, 5080), (10680, 2280), (8700, 7460), (7200, 2160)],
    &[(4560, 2180), (7350, 4940), (3320, 7230), (14580, 7700), (10560, 5060), (13100, 2320)],
    &[(5010, 5260), (11480, 6080), (9100, 1840)],
    &[(14660, 1410), (3450, 7220), (9420, 7240), (5970, 4240)],
    &[(3640, 4420), (8000, 7900), (13300, 5540), (9560, 1400)],
    &[(4100, 7420), (13500, 2340), (12940, 7220), (5640, 2580)],
    &[(14520, 7780), (6320, 4290), (7800, 860), (7660, 5970), (3140, 7540), (9520, 4380)],
    &[(10040, 5970), (13920, 1940), (8020, 3260), (2670, 7020)],
    &[(7500, 6940), (6000, 5360), (11300, 2820)],
    &[(4060, 4660), (13040, 1900), (6560, 7840), (7480, 1360), (12700, 7100)],
    &[(3020, 5190), (6280, 7760), (14100, 7760), (13880, 1220), (10240, 4920), (6100, 2200)],
    &[(10323, 3366), (11203, 5425), (7259, 6656), (5425, 2838)],
];

/// Recorded layouts in game order, checkpoint 0 (start and finish) first.
pub fn recorded_circuits() -> Vec<Circuit> {
    RECORDED_CIRCUITS
        .iter()
        .map(|points| {
            Circuit::new(
                points
                    .iter()
                    .map(|&(x, y)| MapPoint::new(x, y))
                    .collect(),
            )
        })
        .collect()
}

/// Recorded layouts in the order a racing pod first targets them: the pod
/// starts on checkpoint 0, so discovery sees checkpoint 1 first and the
/// finish line last.
pub fn discovery_library() -> Vec<Circuit> {
    recorded_circuits()
        .into_iter()
        .map(|mut circuit| {
            circuit.checkpoints.rotate_left(1);
            circuit
        })
        .collect()
}

/// Reproducible practice layout: 3 to 8 checkpoints kept inside the map
/// margins and at least 2500 units apart from each other.
pub fn random_circuit(seed: u32) -> Circuit {
    const MARGIN: i32 = 1_000;
    const MIN_SPACING: f64 = 2_500.0;
    const MAX_ATTEMPTS: usize = 200;

    let mut rng = SeededRng::new(seed);
    let count = rng.next_range(3, 9) as usize;
    let mut checkpoints: Vec<MapPoint> = Vec::with_capacity(count);

    let mut attempts = 0;
    while checkpoints.len() < count && attempts < MAX_ATTEMPTS {
        attempts += 1;
        let candidate = MapPoint::new(
            rng.next_range(MARGIN, MAP_WIDTH - MARGIN),
            rng.next_range(MARGIN, MAP_HEIGHT - MARGIN),
        );
        if checkpoints
            .iter()
            .all(|cp| cp.distance_to(candidate) >= MIN_SPACING)
        {
            checkpoints.push(candidate);
        }
    }

    // Crowded draws can stop early; a race needs at least two checkpoints.
    if checkpoints.len() < 2 {
        checkpoints = vec![
            MapPoint::new(MARGIN * 3, MAP_HEIGHT / 2),
            MapPoint::new(MAP_WIDTH - MARGIN * 3, MAP_HEIGHT / 2),
        ];
    }

    Circuit::new(checkpoints)
}
