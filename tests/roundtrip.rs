//! End-to-end tests: pack directories of `.brwav` files, extract the result,
//! and check the layout invariants of freshly packed archives.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use brwartool::rwar::{PackSummary, RwarArchive, SUB_FILE_ALIGNMENT, SectionKind};
use brwartool::{Error, LocalFileReader, MemoryReader, RwarExtractor, RwarPacker};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn write_inputs(dir: &Path, files: &[(&str, Vec<u8>)]) {
    for (name, data) in files {
        fs::write(dir.join(name), data).unwrap();
    }
}

async fn pack(input: &Path) -> Vec<u8> {
    RwarPacker::from_dir(input)
        .await
        .unwrap()
        .pack_to_memory(|_| {})
        .await
        .unwrap()
}

async fn parse(bytes: Vec<u8>) -> RwarArchive {
    RwarExtractor::new(Arc::new(MemoryReader::new(bytes)))
        .read_archive()
        .await
        .unwrap()
}

/// Same sequence as the `create` subcommand.
async fn create_archive(input: &Path, archive: &Path) -> brwartool::Result<PackSummary> {
    RwarPacker::from_dir(input)
        .await?
        .pack_to_file(archive, |_| {})
        .await
}

fn sorted_dir(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn pack_then_extract_reproduces_files() {
    let input = TempDir::new().unwrap();
    let files: Vec<(String, Vec<u8>)> = (0..6)
        .map(|i| {
            let data = (0..(i * 7 + 1)).map(|b| (b * 31 + i) as u8).collect();
            (format!("{i}.brwav"), data)
        })
        .collect();
    for (name, data) in &files {
        fs::write(input.path().join(name), data).unwrap();
    }

    let work = TempDir::new().unwrap();
    let archive = work.path().join("out.brwar");
    let summary = RwarPacker::from_dir(input.path())
        .await
        .unwrap()
        .pack_to_file(&archive, |_| {})
        .await
        .unwrap();
    assert_eq!(summary.entries, 6);
    assert_eq!(summary.archive_length, fs::metadata(&archive).unwrap().len());

    let output = work.path().join("extracted");
    let extractor = RwarExtractor::new(Arc::new(LocalFileReader::new(&archive).unwrap()));
    let mut seen = Vec::new();
    let written = extractor
        .extract_all(&output, |entry, _| seen.push(entry.index))
        .await
        .unwrap();

    assert_eq!(seen, vec![0, 1, 2, 3, 4, 5]);
    assert_eq!(written.len(), files.len());
    for (name, data) in &files {
        assert_eq!(&fs::read(output.join(name)).unwrap(), data, "{name}");
    }
}

#[tokio::test]
async fn entries_stay_inside_data_section_and_are_aligned() {
    let input = TempDir::new().unwrap();
    write_inputs(
        input.path(),
        &[
            ("0.brwav", vec![1; 1]),
            ("1.brwav", vec![2; 6]),
            ("2.brwav", vec![3; 33]),
            ("3.brwav", vec![]),
            ("4.brwav", vec![5; 4]),
        ],
    );

    let archive = parse(pack(input.path()).await).await;
    let data_length = archive.data.length as u64;

    for entry in &archive.entries {
        assert_eq!(entry.offset as u64 % SUB_FILE_ALIGNMENT, 0, "entry #{}", entry.index);
        assert!(entry.offset as u64 + entry.length as u64 <= data_length);
    }
}

#[tokio::test]
async fn table_length_is_stored_twice_identically() {
    let input = TempDir::new().unwrap();
    write_inputs(input.path(), &[("0.brwav", vec![9; 3]), ("1.brwav", vec![8; 5])]);

    let bytes = pack(input.path()).await;
    let archive = parse(bytes.clone()).await;

    let table = archive.table.offset as usize;
    let inline = i32::from_be_bytes(bytes[table + 4..table + 8].try_into().unwrap());
    assert_eq!(archive.table.length, inline);

    let data = archive.data.offset as usize;
    let inline = i32::from_be_bytes(bytes[data + 4..data + 8].try_into().unwrap());
    assert_eq!(archive.data.length, inline);
    assert_eq!(archive.header.file_length as usize, bytes.len());
    assert_eq!(&bytes[data..data + 4], SectionKind::Data.tag());
}

#[tokio::test]
async fn non_numeric_name_fails_without_output() {
    let input = TempDir::new().unwrap();
    write_inputs(input.path(), &[("0.brwav", vec![1; 4]), ("abc.brwav", vec![2; 4])]);

    let work = TempDir::new().unwrap();
    let nested = work.path().join("nested");
    let archive = nested.join("out.brwar");
    let err = create_archive(input.path(), &archive).await.unwrap_err();

    assert!(matches!(&err, Error::InvalidFileName(name) if name == "abc.brwav"));
    assert!(!archive.exists());
    assert!(!nested.exists());
}

#[tokio::test]
async fn duplicate_ids_are_rejected() {
    let input = TempDir::new().unwrap();
    write_inputs(input.path(), &[("7.brwav", vec![1]), ("007.brwav", vec![2])]);

    let err = RwarPacker::from_dir(input.path()).await.err().unwrap();
    assert!(matches!(err, Error::DuplicateFileId { id: 7, .. }));
}

#[tokio::test]
async fn other_files_and_folders_are_ignored() {
    let input = TempDir::new().unwrap();
    write_inputs(
        input.path(),
        &[("0.brwav", vec![1]), ("readme.txt", vec![2]), ("1.BRWAV", vec![3])],
    );
    fs::create_dir(input.path().join("9.brwav")).unwrap();

    let packer = RwarPacker::from_dir(input.path()).await.unwrap();
    let ids: Vec<u32> = packer.inputs().iter().map(|f| f.id).collect();
    assert_eq!(ids, vec![0, 1]);
}

#[tokio::test]
async fn foreign_file_fails_before_creating_output() {
    let work = TempDir::new().unwrap();
    let archive = work.path().join("not.brwar");
    let mut bytes = b"RIFF".to_vec();
    bytes.resize(0x80, 0);
    fs::write(&archive, bytes).unwrap();

    let output = work.path().join("extracted");
    let extractor = RwarExtractor::new(Arc::new(LocalFileReader::new(&archive).unwrap()));
    let err = extractor.extract_all(&output, |_, _| {}).await.unwrap_err();

    assert!(matches!(&err, Error::BadMagic { found } if found == "RIFF"));
    assert!(!output.exists());
}

#[tokio::test]
async fn corrupt_table_fails_before_creating_output() {
    let input = TempDir::new().unwrap();
    write_inputs(input.path(), &[("0.brwav", vec![1; 8]), ("1.brwav", vec![2; 8])]);
    let mut bytes = pack(input.path()).await;
    // Length of entry #1 reaches far past the DATA section.
    bytes[0x40..0x44].copy_from_slice(&0x7000i32.to_be_bytes());

    let work = TempDir::new().unwrap();
    let output = work.path().join("extracted");
    let extractor = RwarExtractor::new(Arc::new(MemoryReader::new(bytes)));
    let err = extractor.extract_all(&output, |_, _| {}).await.unwrap_err();

    assert!(matches!(err, Error::EntryOutOfRange { index: 1, .. }));
    assert!(!output.exists());
}

#[tokio::test]
async fn lengths_ten_three_zero() {
    let input = TempDir::new().unwrap();
    write_inputs(
        input.path(),
        &[("0.brwav", vec![0xA0; 10]), ("1.brwav", vec![0xB0; 3]), ("2.brwav", vec![])],
    );

    let archive = parse(pack(input.path()).await).await;
    let lengths: Vec<u32> = archive.entries.iter().map(|e| e.length).collect();
    assert_eq!(lengths, vec![10, 3, 0]);

    let offsets: Vec<u32> = archive.entries.iter().map(|e| e.offset).collect();
    assert!(offsets.iter().all(|o| u64::from(*o) % SUB_FILE_ALIGNMENT == 0));
    assert!(offsets.windows(2).all(|w| w[0] < w[1]));
}

#[tokio::test]
async fn table_order_follows_numeric_ids_not_names() {
    let input = TempDir::new().unwrap();
    write_inputs(
        input.path(),
        &[("5.brwav", b"five".to_vec()), ("2.brwav", b"two".to_vec()), ("10.brwav", b"ten".to_vec())],
    );

    let packer = RwarPacker::from_dir(input.path()).await.unwrap();
    let order: Vec<PathBuf> = packer
        .inputs()
        .iter()
        .map(|f| PathBuf::from(f.path.file_name().unwrap()))
        .collect();
    assert_eq!(
        order,
        vec![
            PathBuf::from("2.brwav"),
            PathBuf::from("5.brwav"),
            PathBuf::from("10.brwav")
        ]
    );

    let bytes = packer.pack_to_memory(|_| {}).await.unwrap();
    let work = TempDir::new().unwrap();
    let extractor = RwarExtractor::new(Arc::new(MemoryReader::new(bytes)));
    extractor.extract_all(work.path(), |_, _| {}).await.unwrap();

    assert_eq!(sorted_dir(work.path()), vec!["0.brwav", "1.brwav", "2.brwav"]);
    assert_eq!(fs::read(work.path().join("0.brwav")).unwrap(), b"two");
    assert_eq!(fs::read(work.path().join("1.brwav")).unwrap(), b"five");
    assert_eq!(fs::read(work.path().join("2.brwav")).unwrap(), b"ten");
}

#[tokio::test]
async fn empty_folder_packs_to_empty_archive() {
    let input = TempDir::new().unwrap();

    let archive = parse(pack(input.path()).await).await;
    assert!(archive.entries.is_empty());
    assert_eq!(archive.data.length, 0x20);
}
