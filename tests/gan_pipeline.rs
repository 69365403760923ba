use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use ferrite_gan::data::{to_tensor, DEFAULT_OUTPUT_SIZE};
use ferrite_gan::{
    generate_file, train, GanError, GanSpec, GeneratorInput, LoadedGenerator, Shape, StopReason,
    TrainConfig,
};
use image::{DynamicImage, Rgb, RgbImage};
use tempfile::tempdir;

fn write_images(dir: &Path, count: u32, width: u32, height: u32) {
    std::fs::create_dir_all(dir).unwrap();
    for i in 0..count {
        let img = RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x * 4 + i) as u8, (y * 4) as u8, (i * 20) as u8])
        });
        DynamicImage::ImageRgb8(img).save(dir.join(format!("img_{i:02}.png"))).unwrap();
    }
}

fn narrow(image_shape: Shape, generator_input: GeneratorInput) -> GanSpec {
    GanSpec {
        image_shape,
        generator_input,
        generator_hidden: vec![8],
        discriminator_hidden: vec![8],
    }
}

#[test]
fn empty_dataset_fails_before_anything_is_built() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("data");
    std::fs::create_dir(&data).unwrap();
    let model = dir.path().join("model.json");

    let err = train(&data, &model, &GanSpec::default(), TrainConfig::new(1, 4, 0)).unwrap_err();
    assert!(matches!(err, GanError::DatasetLoad { .. }), "got {err}");
    assert!(!model.exists());
}

#[test]
fn one_step_on_full_size_images_saves_a_model() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("data");
    write_images(&data, 10, 64, 64);
    let model = dir.path().join("out").join("model.json");

    let spec = narrow(Shape::image(64, 64, 3), GeneratorInput::Image);
    let report = train(&data, &model, &spec, TrainConfig::new(1, 4, 0)).unwrap();

    assert_eq!(report.steps_run, 1);
    assert_eq!(report.stop_reason, StopReason::StepLimit);
    let first = &report.history[0];
    assert_eq!(first.step, 0);
    assert!(first.generator_loss.is_finite() && first.discriminator_loss.is_finite());
    assert!(first.discriminator_loss >= 0.0);
    assert!(model.exists());

    let loaded = LoadedGenerator::load(&model).unwrap();
    assert_eq!(loaded.output_shape(), &Shape::image(64, 64, 3));
    assert_eq!(loaded.saved().metadata.trained_steps, Some(1));
}

#[test]
fn missing_model_is_model_load_and_writes_nothing() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("in.png");
    write_images(dir.path(), 1, 20, 20);
    std::fs::rename(dir.path().join("img_00.png"), &input).unwrap();
    let output = dir.path().join("out.png");

    let err = generate_file(&input, dir.path().join("nope.json"), &output, DEFAULT_OUTPUT_SIZE).unwrap_err();
    assert!(matches!(err, GanError::ModelLoad { .. }));
    assert!(!output.exists());
}

#[test]
fn any_input_resolution_comes_out_at_256() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("data");
    write_images(&data, 3, 16, 16);
    let model = dir.path().join("model.json");
    let spec = narrow(Shape::image(16, 16, 3), GeneratorInput::Image);
    train(&data, &model, &spec, TrainConfig::new(2, 2, 1)).unwrap();

    for (w, h) in [(300, 120), (7, 9)] {
        let input = dir.path().join(format!("in_{w}x{h}.png"));
        DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb([10, 200, 40]))).save(&input).unwrap();
        let output = dir.path().join(format!("out_{w}x{h}.png"));

        generate_file(&input, &model, &output, DEFAULT_OUTPUT_SIZE).unwrap();
        let written = image::open(&output).unwrap();
        assert_eq!((written.width(), written.height()), (256, 256));
    }
}

#[test]
fn two_loads_give_bit_identical_output() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("data");
    write_images(&data, 4, 8, 8);
    let model = dir.path().join("model.json");
    train(&data, &model, &narrow(Shape::image(8, 8, 3), GeneratorInput::Image), TrainConfig::new(3, 2, 2)).unwrap();

    let probe = image::open(data.join("img_01.png")).unwrap();
    let first = LoadedGenerator::load(&model).unwrap();
    let second = LoadedGenerator::load(&model).unwrap();
    let input = to_tensor(&probe, first.input_shape()).unwrap();

    let a = first.run(&input).unwrap();
    let b = second.run(&input).unwrap();
    assert_eq!(a.data().len(), b.data().len());
    assert!(a.data().iter().zip(b.data()).all(|(x, y)| x.to_bits() == y.to_bits()));
}

#[test]
fn fixed_seed_reproduces_the_run() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("data");
    write_images(&data, 5, 8, 8);
    let spec = narrow(Shape::image(8, 8, 3), GeneratorInput::Latent { dim: 4 });

    let run = |name: &str| {
        let model = dir.path().join(name);
        let config = TrainConfig { log_every: 1, ..TrainConfig::new(4, 3, 99) };
        let report = train(&data, &model, &spec, config).unwrap();
        let losses: Vec<(f64, f64)> = report.history.iter()
            .map(|s| (s.generator_loss, s.discriminator_loss))
            .collect();
        (losses, std::fs::read(&model).unwrap())
    };

    let (losses_a, bytes_a) = run("a.json");
    let (losses_b, bytes_b) = run("b.json");
    assert_eq!(losses_a.len(), 4);
    assert_eq!(losses_a, losses_b);
    assert_eq!(bytes_a, bytes_b);

    let sample = LoadedGenerator::load(dir.path().join("a.json")).unwrap().sample(1).unwrap();
    assert_eq!((sample.width(), sample.height()), (8, 8));
}

#[test]
fn raised_stop_flag_ends_training_at_a_step_boundary() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("data");
    write_images(&data, 2, 8, 8);
    let model = dir.path().join("model.json");

    let config = TrainConfig {
        stop_flag: Some(Arc::new(AtomicBool::new(true))),
        ..TrainConfig::new(1_000, 2, 0)
    };
    let report = train(&data, &model, &narrow(Shape::image(8, 8, 3), GeneratorInput::Image), config).unwrap();
    assert_eq!(report.stop_reason, StopReason::Cancelled);
    assert_eq!(report.steps_run, 0);
    assert!(model.exists());
}

#[test]
fn unwritable_model_path_is_persistence_error() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("data");
    write_images(&data, 2, 8, 8);
    let blocker = dir.path().join("not_a_dir");
    std::fs::write(&blocker, b"occupied").unwrap();
    let model = blocker.join("model.json");

    let spec = narrow(Shape::image(8, 8, 3), GeneratorInput::Image);
    let err = train(&data, &model, &spec, TrainConfig::new(1, 2, 0)).unwrap_err();
    assert!(matches!(err, GanError::Persistence { .. }), "got {err}");
    assert!(!model.exists());
    assert_eq!(std::fs::read(&blocker).unwrap(), b"occupied");
}
