// Common test fixtures for integration tests.
//
// Provides two three-level hierarchies shared by the dispatch and lifecycle
// suites:
//
// - the "speed" hierarchy: a root class with a guarded `set_speed`, a middle
//   class that overrides it to also record an announcement, and a leaf class
//   that adds nothing of its own
// - the vehicle/car/racecar hierarchy: `accelerate` declared at the root,
//   overridden with a top-speed guard at the car level, re-overridden with a
//   boost at the racecar level, and a racecar-owned driver name released by
//   the racecar's deinit

#![allow(dead_code)]

use lineage::{
    Class, Config, Error, MethodArgs, Object, ObjectRef, Result, Slot,
};
use std::any::Any;
use std::sync::Mutex;

pub struct RootCfg {
    pub top: i64,
}

pub struct RootState {
    pub top: i64,
    pub speed: i64,
}

pub struct MidCfg {
    pub label: &'static str,
}

pub struct MidState {
    pub label: &'static str,
    pub announced: i64,
}

pub fn set_speed_slot() -> Slot {
    Slot::new("set_speed")
}

pub fn speed_slot() -> Slot {
    Slot::new("speed")
}

pub fn announced_slot() -> Slot {
    Slot::new("announced")
}

fn root_init(cfg: &dyn Any) -> Result<Box<dyn Any>> {
    let cfg = cfg
        .downcast_ref::<RootCfg>()
        .ok_or(Error::ConfigMismatch { expected: "RootCfg" })?;
    Ok(Box::new(RootState { top: cfg.top, speed: 0 }))
}

fn mid_init(cfg: &dyn Any) -> Result<Box<dyn Any>> {
    let cfg = cfg
        .downcast_ref::<MidCfg>()
        .ok_or(Error::ConfigMismatch { expected: "MidCfg" })?;
    Ok(Box::new(MidState { label: cfg.label, announced: 0 }))
}

/// Root implementation: accept the new speed only when it is within the
/// configured top speed.
fn root_set_speed(
    recv: &mut ObjectRef<'_>,
    args: &MethodArgs<'_>,
) -> Result<Option<i64>> {
    let v = args.get(0).unwrap_or(0);
    let state = recv.state_mut::<RootState>()?;
    if v <= state.top {
        state.speed = v;
    }
    Ok(None)
}

fn root_speed(
    recv: &mut ObjectRef<'_>,
    _args: &MethodArgs<'_>,
) -> Result<Option<i64>> {
    Ok(Some(recv.state::<RootState>()?.speed))
}

/// Mid override: run the same guard, and on acceptance record an
/// announcement in the mid level's own state. The receiver arrives typed at
/// the declaring (root) class, so reaching the mid state takes a checked
/// down-cast, exactly like any external caller.
fn mid_set_speed(
    recv: &mut ObjectRef<'_>,
    args: &MethodArgs<'_>,
) -> Result<Option<i64>> {
    let v = args.get(0).unwrap_or(0);
    let accepted = {
        let state = recv.state_mut::<RootState>()?;
        if v <= state.top {
            state.speed = v;
            true
        } else {
            false
        }
    };

    if accepted {
        let mid_class = recv
            .concrete_class()
            .at_depth(1)
            .expect("mid level missing from chain");
        let mut mid_view = recv.reborrow().downcast(&mid_class)?;
        mid_view.state_mut::<MidState>()?.announced += 1;
    }
    Ok(None)
}

fn mid_announced(
    recv: &mut ObjectRef<'_>,
    _args: &MethodArgs<'_>,
) -> Result<Option<i64>> {
    Ok(Some(recv.state::<MidState>()?.announced))
}

/// Registers `{prefix}Root` / `{prefix}Mid` / `{prefix}Leaf`.
///
/// Each test uses its own prefix; the class registry is process-wide.
pub fn speed_hierarchy(prefix: &str) -> (Class, Class, Class) {
    let root = Class::builder(&format!("{prefix}Root"))
        .init(root_init)
        .slot(set_speed_slot(), 1, root_set_speed)
        .slot(speed_slot(), 0, root_speed)
        .register()
        .expect("failed to register root fixture class");
    let mid = Class::builder(&format!("{prefix}Mid"))
        .extends(&root)
        .init(mid_init)
        .override_slot(set_speed_slot(), mid_set_speed)
        .slot(announced_slot(), 0, mid_announced)
        .register()
        .expect("failed to register mid fixture class");
    let leaf = Class::builder(&format!("{prefix}Leaf"))
        .extends(&mid)
        .register()
        .expect("failed to register leaf fixture class");
    (root, mid, leaf)
}

/// Constructs a leaf instance with the given top speed and label.
pub fn create_leaf(leaf: &Class, top: i64, label: &'static str) -> Object {
    let root_cfg = RootCfg { top };
    let mid_cfg = MidCfg { label };
    let base = Config::root(&root_cfg);
    let mid = Config::derived(&mid_cfg, &base);
    Object::create(leaf, &Config::derived(&(), &mid))
        .expect("failed to construct leaf fixture instance")
}

pub struct VehicleState {
    pub speed: i64,
}

pub struct CarCfg {
    pub top_speed: i64,
}

pub struct CarState {
    pub top_speed: i64,
}

pub struct RacecarCfg {
    pub driver: &'static str,
    pub boost: i64,
}

pub struct RacecarState {
    pub driver: String,
    pub boost: i64,
}

/// Driver names released by the racecar deinit, in release order. Tests
/// pick a unique driver name and look for it here after dropping.
static RELEASED_DRIVERS: Mutex<Vec<String>> = Mutex::new(Vec::new());

pub fn released_drivers() -> Vec<String> {
    RELEASED_DRIVERS.lock().unwrap().clone()
}

pub fn accelerate_slot() -> Slot {
    Slot::new("accelerate")
}

pub fn current_speed_slot() -> Slot {
    Slot::new("current_speed")
}

fn vehicle_init(_cfg: &dyn Any) -> Result<Box<dyn Any>> {
    Ok(Box::new(VehicleState { speed: 0 }))
}

fn car_init(cfg: &dyn Any) -> Result<Box<dyn Any>> {
    let cfg = cfg
        .downcast_ref::<CarCfg>()
        .ok_or(Error::ConfigMismatch { expected: "CarCfg" })?;
    Ok(Box::new(CarState { top_speed: cfg.top_speed }))
}

fn racecar_init(cfg: &dyn Any) -> Result<Box<dyn Any>> {
    let cfg = cfg
        .downcast_ref::<RacecarCfg>()
        .ok_or(Error::ConfigMismatch { expected: "RacecarCfg" })?;
    Ok(Box::new(RacecarState {
        driver: cfg.driver.to_string(),
        boost: cfg.boost,
    }))
}

/// Releases the racecar's owned driver name before the runtime frees the
/// state block, recording the release so tests can observe it.
fn racecar_deinit(state: &mut dyn Any) {
    if let Some(state) = state.downcast_mut::<RacecarState>() {
        let driver = std::mem::take(&mut state.driver);
        RELEASED_DRIVERS.lock().unwrap().push(driver);
    }
}

/// Root implementation: no limit, just add the delta.
fn vehicle_accelerate(
    recv: &mut ObjectRef<'_>,
    args: &MethodArgs<'_>,
) -> Result<Option<i64>> {
    let d = args.get(0).unwrap_or(0);
    let state = recv.state_mut::<VehicleState>()?;
    state.speed += d;
    Ok(Some(state.speed))
}

fn vehicle_current_speed(
    recv: &mut ObjectRef<'_>,
    _args: &MethodArgs<'_>,
) -> Result<Option<i64>> {
    Ok(Some(recv.state::<VehicleState>()?.speed))
}

/// Car override: accelerate only while the result stays within the
/// configured top speed.
fn car_accelerate(
    recv: &mut ObjectRef<'_>,
    args: &MethodArgs<'_>,
) -> Result<Option<i64>> {
    let d = args.get(0).unwrap_or(0);
    let top_speed = {
        let car_class = recv
            .concrete_class()
            .at_depth(1)
            .expect("car level missing from chain");
        let car_view = recv.reborrow().downcast(&car_class)?;
        car_view.state::<CarState>()?.top_speed
    };

    let state = recv.state_mut::<VehicleState>()?;
    if state.speed + d <= top_speed {
        state.speed += d;
    }
    Ok(Some(state.speed))
}

/// Racecar re-override: race tuning ignores the road cap and adds the
/// configured boost on top of every delta.
fn racecar_accelerate(
    recv: &mut ObjectRef<'_>,
    args: &MethodArgs<'_>,
) -> Result<Option<i64>> {
    let d = args.get(0).unwrap_or(0);
    let boost = {
        let racecar_class = recv
            .concrete_class()
            .at_depth(2)
            .expect("racecar level missing from chain");
        let racecar_view = recv.reborrow().downcast(&racecar_class)?;
        racecar_view.state::<RacecarState>()?.boost
    };

    let state = recv.state_mut::<VehicleState>()?;
    state.speed += d + boost;
    Ok(Some(state.speed))
}

/// Registers `{prefix}Vehicle` / `{prefix}Car` / `{prefix}Racecar`.
pub fn vehicle_hierarchy(prefix: &str) -> (Class, Class, Class) {
    let vehicle = Class::builder(&format!("{prefix}Vehicle"))
        .init(vehicle_init)
        .slot(accelerate_slot(), 1, vehicle_accelerate)
        .slot(current_speed_slot(), 0, vehicle_current_speed)
        .register()
        .expect("failed to register vehicle fixture class");
    let car = Class::builder(&format!("{prefix}Car"))
        .extends(&vehicle)
        .init(car_init)
        .override_slot(accelerate_slot(), car_accelerate)
        .register()
        .expect("failed to register car fixture class");
    let racecar = Class::builder(&format!("{prefix}Racecar"))
        .extends(&car)
        .init(racecar_init)
        .deinit(racecar_deinit)
        .override_slot(accelerate_slot(), racecar_accelerate)
        .register()
        .expect("failed to register racecar fixture class");
    (vehicle, car, racecar)
}

/// Constructs a car instance with the given top speed.
pub fn create_car(car: &Class, top_speed: i64) -> Object {
    let car_cfg = CarCfg { top_speed };
    let base = Config::root(&());
    Object::create(car, &Config::derived(&car_cfg, &base))
        .expect("failed to construct car fixture instance")
}

/// Constructs a racecar instance with the given top speed, driver, and
/// boost.
pub fn create_racecar(
    racecar: &Class,
    top_speed: i64,
    driver: &'static str,
    boost: i64,
) -> Object {
    let car_cfg = CarCfg { top_speed };
    let racecar_cfg = RacecarCfg { driver, boost };
    let base = Config::root(&());
    let car = Config::derived(&car_cfg, &base);
    Object::create(racecar, &Config::derived(&racecar_cfg, &car))
        .expect("failed to construct racecar fixture instance")
}
