use std::{path::PathBuf, process::ExitCode};

use clap::Parser;
use log::{error, info};
use ratmaze::{
    parallel::{self, ParallelOptions},
    util::load_grid,
    Cell, CellStorage, GridMap, MapStorage, PathFinder, PathFinderState, Point,
};

#[derive(Parser, Debug)]
#[command(name = "ratmaze")]
#[command(about = "Find a way through a square maze moving only down and right")]
struct Args {
    /// Maze to solve (text, JSON or image). An open maze of `--size` is used when missing
    maze: Option<PathBuf>,

    /// Size of the open maze used when no file is given
    #[arg(long, short, default_value_t = 4)]
    size: usize,

    /// Toggle a cell before solving, given as `row,col`. Can be repeated
    #[arg(long = "toggle", value_parser = parse_point)]
    toggles: Vec<Point>,

    /// Explore both directions of a cell in parallel
    #[arg(long)]
    parallel: bool,

    /// Print every cell as soon as it is visited
    #[arg(long)]
    trace: bool,

    /// Solve the maze even if it has no obstacle
    #[arg(long)]
    skip_validation: bool,
}

fn parse_point(s: &str) -> Result<Point, String> {
    s.parse().map_err(|e: anyhow::Error| e.to_string())
}

/// Blocked cells as `X`, the path as `*`, other visited cells as `o`
fn draw(map: &GridMap, visited: &CellStorage<bool>, path: &[Point]) -> String {
    let mut out = String::new();
    for row in 0..map.size() {
        for col in 0..map.size() {
            let point = Point { row, col };
            out.push(match map.get(point) {
                Some(Cell::Blocked) => 'X',
                _ if path.contains(&point) => '*',
                _ if visited.get(point) => 'o',
                _ => '.',
            });
        }
        out.push('\n');
    }
    out
}

fn main() -> Result<ExitCode, anyhow::Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let mut map = match &args.maze {
        Some(path) => load_grid(path)?,
        None => GridMap::new(args.size),
    };
    // toggles outside of the maze are ignored
    for point in &args.toggles {
        map.toggle(*point);
    }

    println!("{}", map);

    if let Err(rejection) = map.validate() {
        if args.skip_validation && rejection == ratmaze::Rejection::NoObstacles {
            info!("{}, solving anyway", rejection);
        } else {
            error!("{}", rejection);
            return Ok(ExitCode::FAILURE);
        }
    }

    let trace = args.trace;
    let (state, visited) = if args.parallel {
        parallel::solve_with(&map, &ParallelOptions::default(), &|p: Point| {
            if trace {
                println!("visit {}", p);
            }
        })
    } else {
        PathFinder::new(&map).finish_with(&map, &mut |p: Point| {
            if trace {
                println!("visit {}", p);
            }
        })
    };

    match &state {
        PathFinderState::PathFound(result) => {
            info!(
                "maze solved, path of {} cells, {} cells visited",
                result.path.len(),
                visited.count()
            );
            println!("{}", draw(&map, &visited, &result.path));
        }
        PathFinderState::NoPathFound => {
            info!("there are no possible solutions, {} cells visited", visited.count());
            println!("{}", draw(&map, &visited, &[]));
        }
        PathFinderState::InvalidStart => error!("{}", ratmaze::Rejection::InvalidStart),
        PathFinderState::Computing => unreachable!("finished search is never computing"),
    }

    Ok(ExitCode::from(exit_status(&state)))
}

/// An unsolvable maze is a normal answer, only a search that could not run fails
fn exit_status(state: &PathFinderState<Point>) -> u8 {
    match state {
        PathFinderState::PathFound(_) | PathFinderState::NoPathFound => 0,
        PathFinderState::InvalidStart | PathFinderState::Computing => 1,
    }
}
