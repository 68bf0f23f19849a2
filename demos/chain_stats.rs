use clap::Parser;
use slot_chain::FixedKeyMap;

#[derive(Parser, Debug)]
struct Args {
    #[arg(short = 'n', long = "keys", default_value_t = 1000)]
    keys: u64,

    /// Remove every n-th key after filling; 0 keeps everything.
    #[arg(short = 'd', long = "delete_every", default_value_t = 0)]
    delete_every: u64,

    /// Reserve room for all keys up front.
    #[arg(short = 'r', long = "reserve")]
    reserve: bool,
}

fn main() {
    let args = Args::parse();

    let mut map: FixedKeyMap<u64, u64> = if args.reserve {
        FixedKeyMap::with_capacity(args.keys as usize)
    } else {
        FixedKeyMap::new()
    };
    println!(
        "Starting with capacity {} and {} buckets",
        map.capacity(),
        map.bucket_count()
    );

    let mut last_buckets = map.bucket_count();
    for key in 0..args.keys {
        if let Err(err) = map.insert(&key, key * key) {
            eprintln!("insert of {key} failed: {err}");
            return;
        }
        if map.bucket_count() != last_buckets {
            println!(
                "Rehashed {} -> {} buckets at {} entries",
                last_buckets,
                map.bucket_count(),
                map.len()
            );
            last_buckets = map.bucket_count();
        }
    }

    if args.delete_every > 0 {
        let removed = (0..args.keys)
            .step_by(args.delete_every as usize)
            .filter(|key| map.remove(key))
            .count();
        println!("Removed {removed} keys");
    }

    println!(
        "{} entries, capacity {}, {} buckets",
        map.len(),
        map.capacity(),
        map.bucket_count()
    );
    map.stats().print();
}
