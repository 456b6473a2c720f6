use anyhow::Result;
use slotsource::testing::{EVENTS_TABLE, events_dataset, expected_pt, sample_events, write_fixture};
use slotsource::{
    ArrayView, Dataset, DatasetSource, Error, Partition, SourceOptions, partition_rows,
};

fn source_with(dir: &std::path::Path, sizes: &[usize], slots: usize) -> Result<DatasetSource> {
    let mut source = DatasetSource::new(events_dataset(dir, sizes)?);
    source.set_parallelism(slots)?;
    Ok(source)
}

#[test]
fn partitions_cover_all_files_as_one_row_space() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let mut source = source_with(tmp.path(), &[3, 0, 4, 3], 3)?;

    let parts = source.compute_partitions()?;
    assert_eq!(
        parts,
        vec![Partition::new(0, 4), Partition::new(4, 7), Partition::new(7, 10)]
    );
    assert_eq!(source.total_rows()?, 10);
    assert_eq!(source.partitions()?, parts.as_slice());
    Ok(())
}

#[test]
fn every_row_reads_back_across_file_boundaries() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let mut source = DatasetSource::with_options(
        events_dataset(tmp.path(), &[5, 2, 6])?,
        SourceOptions {
            batch_size: 2,
            parallelism: 2,
        },
    );
    let parts = source.compute_partitions()?;

    let mut seen = Vec::new();
    for (i, range) in parts.iter().enumerate() {
        let slot = source.initialize_slot(i, *range)?;
        let id = slot.column_reader::<i64>("id")?;
        let pt = slot.column_reader::<ArrayView<f32>>("pt")?;
        for row in range.rows() {
            slot.advance(row)?;
            assert_eq!(id.read(row)?, row as i64);
            assert_eq!(pt.read(row)?.to_vec(), expected_pt(row as i64));
            seen.push(row);
        }
        slot.finalize();
    }
    assert_eq!(seen, (0..13).collect::<Vec<_>>());
    Ok(())
}

#[test]
fn cursor_can_move_backwards_and_skip_ahead() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let mut source = DatasetSource::with_options(
        events_dataset(tmp.path(), &[4, 4, 4])?,
        SourceOptions {
            batch_size: 3,
            parallelism: 1,
        },
    );
    let parts = source.compute_partitions()?;
    let slot = source.initialize_slot(0, parts[0])?;
    let label = slot.column_reader::<String>("label")?;

    for row in [0u64, 11, 5, 6, 2, 9] {
        slot.advance(row)?;
        assert_eq!(label.read(row)?, format!("ev{row}"));
    }
    Ok(())
}

#[test]
fn slots_do_not_observe_each_other() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let mut source = source_with(tmp.path(), &[10], 2)?;
    let parts = source.compute_partitions()?;

    let a = source.initialize_slot(0, parts[0])?;
    let b = source.initialize_slot(1, parts[1])?;
    let id_a = a.column_reader::<i64>("id")?;
    let id_b = b.column_reader::<i64>("id")?;

    // Interleave moves; each reader follows only its own slot.
    a.advance(3)?;
    b.advance(8)?;
    assert_eq!(id_a.value()?, 3);
    assert_eq!(id_b.value()?, 8);
    b.advance(5)?;
    assert_eq!(id_a.value()?, 3);
    assert_eq!(id_b.value()?, 5);

    // Two readers of one column share the slot cursor.
    let id_a2 = a.column_reader::<i64>("id")?;
    a.advance(1)?;
    assert_eq!(id_a.value()?, 1);
    assert_eq!(id_a2.value()?, 1);
    Ok(())
}

#[test]
fn slots_run_on_separate_threads() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let mut source = source_with(tmp.path(), &[7, 9], 4)?;
    let parts = source.compute_partitions()?;
    let source = &source;

    let sums: Vec<i64> = std::thread::scope(|scope| {
        let handles: Vec<_> = parts
            .iter()
            .enumerate()
            .map(|(i, range)| {
                let range = *range;
                scope.spawn(move || -> slotsource::Result<i64> {
                    let slot = source.initialize_slot(i, range)?;
                    let id = slot.column_reader::<i64>("id")?;
                    let mut sum = 0;
                    for row in range.rows() {
                        slot.advance(row)?;
                        sum += id.read(row)?;
                    }
                    Ok(sum)
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("slot thread panicked"))
            .collect::<slotsource::Result<Vec<_>>>()
    })?;

    assert_eq!(sums.iter().sum::<i64>(), (0..16).sum::<i64>());
    Ok(())
}

#[test]
fn advance_outside_partition_is_rejected() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let mut source = source_with(tmp.path(), &[10], 3)?;
    let parts = source.compute_partitions()?;
    let slot = source.initialize_slot(1, parts[1])?;

    for row in [3u64, 7, 100] {
        match slot.advance(row) {
            Err(Error::OutOfPartition { slot: 1, row: r, range }) => {
                assert_eq!(r, row);
                assert_eq!(range, parts[1]);
            }
            other => panic!("expected OutOfPartition, got {other:?}"),
        }
    }
    Ok(())
}

#[test]
fn lifecycle_order_is_enforced() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let mut source = source_with(tmp.path(), &[6], 2)?;

    assert!(matches!(
        source.initialize_slot(0, Partition::new(0, 3)),
        Err(Error::InvalidLifecycle(_))
    ));
    assert!(matches!(source.set_parallelism(0), Err(Error::InvalidArgument(_))));

    let parts = source.compute_partitions()?;
    assert!(matches!(source.compute_partitions(), Err(Error::InvalidLifecycle(_))));
    assert!(matches!(source.set_parallelism(3), Err(Error::InvalidLifecycle(_))));

    // Unknown slot, wrong range.
    assert!(matches!(
        source.initialize_slot(2, parts[1]),
        Err(Error::InvalidLifecycle(_))
    ));
    assert!(matches!(
        source.initialize_slot(0, parts[1]),
        Err(Error::InvalidLifecycle(_))
    ));

    // Double initialization while active, then allowed again after finalize.
    let slot = source.initialize_slot(0, parts[0])?;
    assert!(matches!(
        source.initialize_slot(0, parts[0]),
        Err(Error::InvalidLifecycle(_))
    ));
    slot.finalize();
    let again = source.initialize_slot(0, parts[0])?;
    assert_eq!(again.current_row(), Some(0));
    Ok(())
}

#[test]
fn dropped_slot_is_released() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let mut source = source_with(tmp.path(), &[4], 1)?;
    let parts = source.compute_partitions()?;

    let failing = || -> slotsource::Result<()> {
        let slot = source.initialize_slot(0, parts[0])?;
        slot.advance(99)?;
        Ok(())
    };
    assert!(failing().is_err());
    assert!(source.initialize_slot(0, parts[0]).is_ok());
    Ok(())
}

#[test]
fn reader_requires_the_cursor_row() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let mut source = source_with(tmp.path(), &[4], 1)?;
    let parts = source.compute_partitions()?;
    let slot = source.initialize_slot(0, parts[0])?;
    let id = slot.column_reader::<i64>("id")?;

    slot.advance(2)?;
    assert_eq!(id.read(2)?, 2);
    assert!(matches!(id.read(1), Err(Error::InvalidLifecycle(_))));
    Ok(())
}

#[test]
fn missing_and_mistyped_columns_fail_at_bind_time() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let mut source = source_with(tmp.path(), &[4], 1)?;
    let parts = source.compute_partitions()?;
    let slot = source.initialize_slot(0, parts[0])?;

    assert!(matches!(
        slot.column_reader::<i64>("nope"),
        Err(Error::ColumnNotFound(name)) if name == "nope"
    ));
    assert!(matches!(
        slot.column_reader::<f64>("weight"),
        Err(Error::ColumnTypeMismatch { .. })
    ));
    assert!(matches!(
        slot.column_reader::<f32>("pt"),
        Err(Error::ColumnTypeMismatch { .. })
    ));
    assert!(matches!(
        slot.column_reader::<Vec<bool>>("pt"),
        Err(Error::ColumnTypeMismatch { .. })
    ));
    assert!(matches!(
        slot.column_reader::<ArrayView<f32>>("passed"),
        Err(Error::ColumnTypeMismatch { .. })
    ));
    assert!(slot.column_reader::<f32>("weight").is_ok());
    Ok(())
}

#[test]
fn empty_dataset_processes_no_rows() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let mut source = source_with(tmp.path(), &[0], 3)?;
    let parts = source.compute_partitions()?;
    assert_eq!(parts, partition_rows(0, 3)?);

    for (i, range) in parts.iter().enumerate() {
        let slot = source.initialize_slot(i, *range)?;
        assert_eq!(slot.current_row(), None);
        assert_eq!(range.rows().count(), 0);
        let id = slot.column_reader::<i64>("id")?;
        assert!(matches!(id.value(), Err(Error::InvalidLifecycle(_))));
    }
    Ok(())
}

#[test]
fn unresolvable_datasets_fail_before_partitioning() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let path = tmp.path().join("events.parquet");
    write_fixture(&path, EVENTS_TABLE, sample_events(0, 3))?;

    let cases = [
        Dataset::single(&path, "muons"),
        Dataset::single(tmp.path().join("missing.parquet"), EVENTS_TABLE),
        Dataset::new(Vec::<String>::new(), EVENTS_TABLE),
        Dataset::new([format!("{}/nothing-*.parquet", tmp.path().display())], EVENTS_TABLE),
    ];
    for dataset in cases {
        let mut source = DatasetSource::new(dataset);
        assert!(matches!(
            source.compute_partitions(),
            Err(Error::DatasetResolution(_))
        ));
    }
    Ok(())
}

#[test]
fn files_with_different_columns_do_not_resolve() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let a = tmp.path().join("a.parquet");
    let b = tmp.path().join("b.parquet");
    write_fixture(&a, EVENTS_TABLE, sample_events(0, 3))?;
    write_fixture(&b, EVENTS_TABLE, sample_events(3, 3).project(&[0, 1])?)?;

    let mut source = DatasetSource::new(Dataset::new(
        [a.display().to_string(), b.display().to_string()],
        EVENTS_TABLE,
    ));
    assert!(matches!(
        source.compute_partitions(),
        Err(Error::DatasetResolution(_))
    ));
    Ok(())
}
