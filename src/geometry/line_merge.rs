use std::collections::HashMap;

type EndpointKey = (u64, u64);

fn endpoint_key(coord: &geo::Coord) -> EndpointKey {
    (coord.x.to_bits(), coord.y.to_bits())
}

/// Incidence of a line at an endpoint, `at_start` tells which end of the line touches it.
#[derive(Clone, Copy)]
struct Incidence {
    line: usize,
    at_start: bool,
}

/// Merge lines that share endpoints into continuous lines.
///
/// Lines are joined only through endpoints touched by exactly two line ends, so junctions where three or
/// more lines meet (and dead ends) terminate a merged line. Direction is ignored: a line is reversed when
/// needed to continue a chain. Chains without any terminating endpoint come out as closed rings. Lines with
/// fewer than two coordinates are dropped.
pub fn merge_lines(lines: &[&geo::LineString]) -> Vec<geo::LineString> {
    let lines: Vec<&geo::LineString> = lines.iter().copied().filter(|l| l.0.len() >= 2).collect();

    let mut incidences: HashMap<EndpointKey, Vec<Incidence>> = HashMap::new();
    for (index, line) in lines.iter().enumerate() {
        for (coord, at_start) in [(&line.0[0], true), (&line.0[line.0.len() - 1], false)] {
            incidences
                .entry(endpoint_key(coord))
                .or_default()
                .push(Incidence {
                    line: index,
                    at_start,
                });
        }
    }

    let mut visited = vec![false; lines.len()];
    let mut merged = Vec::new();

    // Open chains start at endpoints which cannot be merged through.
    for (index, line) in lines.iter().enumerate() {
        for (coord, at_start) in [(&line.0[0], true), (&line.0[line.0.len() - 1], false)] {
            if visited[index] || incidences[&endpoint_key(coord)].len() == 2 {
                continue;
            }
            merged.push(walk_chain(
                &lines,
                &incidences,
                &mut visited,
                Incidence {
                    line: index,
                    at_start,
                },
            ));
        }
    }
    // Whatever is left forms rings.
    for index in 0..lines.len() {
        if !visited[index] {
            merged.push(walk_chain(
                &lines,
                &incidences,
                &mut visited,
                Incidence {
                    line: index,
                    at_start: true,
                },
            ));
        }
    }
    merged
}

fn walk_chain(
    lines: &[&geo::LineString],
    incidences: &HashMap<EndpointKey, Vec<Incidence>>,
    visited: &mut [bool],
    start: Incidence,
) -> geo::LineString {
    let mut coords: Vec<geo::Coord> = Vec::new();
    let mut current = start;
    loop {
        visited[current.line] = true;
        let line = lines[current.line];
        let oriented: Vec<geo::Coord> = if current.at_start {
            line.0.clone()
        } else {
            line.0.iter().rev().copied().collect()
        };
        // The first coordinate duplicates the previous piece's last one.
        let skip = usize::from(!coords.is_empty());
        coords.extend(oriented.into_iter().skip(skip));

        let far_end = coords[coords.len() - 1];
        let touching = &incidences[&endpoint_key(&far_end)];
        if touching.len() != 2 {
            break;
        }
        match touching.iter().find(|inc| !visited[inc.line]) {
            Some(next) => current = *next,
            None => break,
        }
    }
    geo::LineString::new(coords)
}
