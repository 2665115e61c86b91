//! Index a handful of stores for one tenant and query the map at three zoom levels.

use geocluster::prelude::*;
use geocluster::InMemoryDirectory;

fn main() -> Result<()> {
    env_logger::init();

    let brand = TenantKey::parse("coffee-co")?;
    let stores = vec![
        StoreRef::new("9q8yyk8yu", "market-st"),
        StoreRef::new("9q8yym000", "mission"),
        StoreRef::new("9q8zz0000", "sausalito"),
        StoreRef::new("dr5regw3p", "soho"),
    ];

    let mut directory = InMemoryDirectory::new();
    for store in &stores {
        directory.insert(&brand, store.key.clone(), format!("Coffee Co - {}", store.key));
    }

    let mut locator = LocatorBuilder::new(MemoryTreeStore::new(), directory).build()?;
    let added = locator.import_stores(&brand, &stores)?;
    println!("Indexed {} stores", added);

    if let Some(tree) = locator.tree(&brand)? {
        print!("{}", tree);
    }

    let san_francisco = LatLng::new(37.7749, -122.4194);
    for zoom in [4u8, 9, 14] {
        let request = ViewportRequest::new(brand.clone(), zoom, san_francisco);
        let response = locator.query(&request)?;
        println!("\nzoom {} -> {} markers", zoom, response.markers_data.len());
        for marker in &response.markers_data {
            println!("  {:?} {} ({})", marker.kind, marker.geohash, marker.count);
        }
        for store in &response.stores {
            println!("  - {}", store);
        }
    }

    Ok(())
}
