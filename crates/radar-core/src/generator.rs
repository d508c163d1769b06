//! Random aircraft generation.
//!
//! Departures are created at the owner airport with a SID drawn from the owner's
//! tables and a STAR drawn from a randomly chosen destination's tables. Route
//! objects are cloned so each aircraft consumes its own copy.

use rand::seq::IndexedRandom;
use rand::Rng;

use crate::error::GenerateError;
use crate::models::{Aircraft, AircraftType, Airline};
use crate::navigation::{Airport, Route, RouteKind};

const GENERAL_AVIATION_PREFIX: &str = "OM-";

/// Create a random departure from `owner` to one of `candidates`.
///
/// `candidates` may include the owner itself; it is never picked as destination.
pub fn generate_aircraft<'a, R, I>(
    rng: &mut R,
    commercial: bool,
    owner: &Airport,
    candidates: I,
) -> Result<Aircraft, GenerateError>
where
    R: Rng + ?Sized,
    I: IntoIterator<Item = &'a Airport>,
{
    let destinations: Vec<&Airport> = candidates
        .into_iter()
        .filter(|a| a.icao != owner.icao)
        .collect();
    let destination = destinations
        .choose(rng)
        .copied()
        .ok_or_else(|| GenerateError::NoDestination {
            owner: owner.icao.clone(),
        })?;

    let sid = random_route(rng, owner, RouteKind::Sid)?;
    let star = random_route(rng, destination, RouteKind::Star)?;

    let aircraft_type = *AircraftType::ALL
        .choose(rng)
        .unwrap_or(&AircraftType::A320);
    let mut aircraft = Aircraft::new(
        aircraft_type,
        random_call_sign(rng, commercial),
        owner.icao.clone(),
        destination.icao.clone(),
        sid,
        star,
    );
    aircraft.final_flight_level = requested_flight_level(rng, commercial);
    aircraft.final_air_speed = requested_speed(rng, commercial);
    Ok(aircraft)
}

fn random_route<R: Rng + ?Sized>(
    rng: &mut R,
    airport: &Airport,
    kind: RouteKind,
) -> Result<Route, GenerateError> {
    airport
        .routes_of(kind)
        .choose(rng)
        .map(|route| (*route).clone())
        .ok_or_else(|| GenerateError::NoRoutes {
            icao: airport.icao.clone(),
            kind,
        })
}

/// Airline code plus three digits, or `OM-` plus three letters.
pub fn random_call_sign<R: Rng + ?Sized>(rng: &mut R, commercial: bool) -> String {
    if commercial {
        let airline = Airline::ALL.choose(rng).unwrap_or(&Airline::CSA);
        let digits: String = (0..3)
            .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
            .collect();
        format!("{airline}{digits}")
    } else {
        let letters: String = (0..3)
            .map(|_| char::from(b'A' + rng.random_range(0..26u8)))
            .collect();
        format!("{GENERAL_AVIATION_PREFIX}{letters}")
    }
}

/// FL110-150 for airliners, FL30-70 for general aviation.
pub fn requested_flight_level<R: Rng + ?Sized>(rng: &mut R, commercial: bool) -> i32 {
    let steps = if commercial {
        rng.random_range(11..=15)
    } else {
        rng.random_range(3..=7)
    };
    steps * 10
}

/// 160-300 kt for airliners, 160-200 kt for general aviation.
pub fn requested_speed<R: Rng + ?Sized>(rng: &mut R, commercial: bool) -> i32 {
    let steps = if commercial {
        rng.random_range(16..=30)
    } else {
        rng.random_range(16..=20)
    };
    steps * 10
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::{AreaBounds, GpsCoordinate};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn airport(icao: &str, sids: &[&str], stars: &[&str]) -> Airport {
        let gps = GpsCoordinate::new(48.0, 17.0).unwrap();
        let bounds = AreaBounds::new(48.5, 17.5, 47.5, 16.5).unwrap();
        let mut airport = Airport::new(icao, icao, gps, bounds);
        for name in sids {
            airport
                .add_route(Route::new(22, *name, RouteKind::Sid, ["A", "B"]))
                .unwrap();
        }
        for name in stars {
            airport
                .add_route(Route::new(22, *name, RouteKind::Star, ["C", "D"]))
                .unwrap();
        }
        airport
    }

    #[test]
    fn test_generated_aircraft_routes_and_destination() {
        let owner = airport("LZIB", &["SID1", "SID2"], &["STAR_OWN"]);
        let dest = airport("LKPR", &["SID_DEST"], &["STAR1", "STAR2"]);
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..100 {
            let acft = generate_aircraft(&mut rng, true, &owner, [&owner, &dest]).unwrap();
            assert_eq!(acft.departure, "LZIB");
            assert_eq!(acft.arrival, "LKPR");
            assert_eq!(acft.sid_route.kind, RouteKind::Sid);
            assert!(acft.sid_route.name.starts_with("SID"));
            assert_ne!(acft.sid_route.name, "SID_DEST");
            assert!(["STAR1", "STAR2"].contains(&acft.star_route.name.as_str()));
            assert_eq!(acft.active, RouteKind::Sid);
            assert_eq!(acft.actual_air_speed, 0);
            assert_eq!(acft.actual_flight_level, 0);
        }
    }

    #[test]
    fn test_no_destination_when_alone() {
        let owner = airport("LZIB", &["SID1"], &["STAR1"]);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            generate_aircraft(&mut rng, true, &owner, [&owner]),
            Err(GenerateError::NoDestination {
                owner: "LZIB".into()
            })
        );
    }

    #[test]
    fn test_missing_routes_fail() {
        let owner = airport("LZIB", &[], &["STAR1"]);
        let dest = airport("LKPR", &["SID1"], &[]);
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            generate_aircraft(&mut rng, false, &owner, [&dest]),
            Err(GenerateError::NoRoutes { kind: RouteKind::Sid, .. })
        ));

        let owner = airport("LZIB", &["SID1"], &[]);
        assert!(matches!(
            generate_aircraft(&mut rng, false, &owner, [&dest]),
            Err(GenerateError::NoRoutes { kind: RouteKind::Star, .. })
        ));
    }

    #[test]
    fn test_call_sign_shapes() {
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..50 {
            let commercial = random_call_sign(&mut rng, true);
            assert_eq!(commercial.len(), 6);
            assert!(commercial[3..].chars().all(|c| c.is_ascii_digit()));

            let private = random_call_sign(&mut rng, false);
            assert!(private.starts_with("OM-"));
            assert!(private[3..].chars().all(|c| c.is_ascii_uppercase()));
            assert_eq!(private.len(), 6);
        }
    }

    #[test]
    fn test_requested_bands() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..200 {
            let fl = requested_flight_level(&mut rng, true);
            assert!((110..=150).contains(&fl) && fl % 10 == 0);
            let fl = requested_flight_level(&mut rng, false);
            assert!((30..=70).contains(&fl) && fl % 10 == 0);
            let speed = requested_speed(&mut rng, true);
            assert!((160..=300).contains(&speed) && speed % 10 == 0);
            let speed = requested_speed(&mut rng, false);
            assert!((160..=200).contains(&speed) && speed % 10 == 0);
        }
    }
}
