use gridsearch::{parse_grid, PathFinder, StepResult};

const PRESET: &str = "
    S.........
    .XXXXXXX..
    .X.....X..
    .X.XXX.X..
    .X.X.E.X..
    .X.X...X..
    .X.XXXXX..
    .X........
    .XXXXXXXX.
    ..........
";

fn main() -> Result<(), anyhow::Error> {
    let mut map = parse_grid(PRESET)?;
    println!("{}", map);

    let mut finder = PathFinder::new();
    finder.start(&mut map)?;

    while let StepResult::InProgress = finder.advance(&mut map)? {}

    println!("{}", map);
    match finder.path() {
        Some(result) => println!(
            "found path of {} cells, cost {}, after {} steps",
            result.path.len(),
            result.total_cost,
            finder.steps()
        ),
        None => println!("no path after {} steps", finder.steps()),
    }

    Ok(())
}
