// demos/balance.rs

//! Host simulation of the balance loop: an inverted pendulum model stands in
//! for the robot, a simulated IMU and H-bridge connect it to the controller,
//! and operator commands are typed in over the simulated serial line.

use balance_stabilization::protocol::CommandSource;
use balance_stabilization::{
    BalanceConfig, CommandProtocol, ControlLoop, Imu, InertialSensor, MotorDriver, RawSample,
    RotationCounters, Wheel,
};
use core::convert::Infallible;
use core::fmt;
use embedded_hal::delay::DelayNs;

static COUNTERS: RotationCounters = RotationCounters::new();

/// Pendulum state in degrees and degrees per second.
struct Plant {
    angle: f32,
    rate: f32,
    speed: f32,
}

impl Plant {
    fn step(&mut self, dt: f32) {
        let acceleration = 9.0 * self.angle + 0.6 * self.speed;
        self.rate += acceleration * dt;
        self.angle += self.rate * dt;
    }
}

struct SimSensor<'a> {
    plant: &'a core::cell::RefCell<Plant>,
}

impl InertialSensor for SimSensor<'_> {
    type Error = Infallible;

    fn identity(&mut self) -> Result<u8, Infallible> {
        Ok(0x68)
    }

    fn configure(&mut self) -> Result<(), Infallible> {
        Ok(())
    }

    fn read_raw(&mut self) -> Result<RawSample, Infallible> {
        let plant = self.plant.borrow();
        let radians = plant.angle.to_radians();
        Ok(RawSample {
            accel: [
                0,
                (radians.sin() * 16384.0) as i16,
                (radians.cos() * 16384.0) as i16,
            ],
            gyro: [(plant.rate * 131.0).clamp(-32768.0, 32767.0) as i16, 0, 0],
        })
    }
}

struct SimDriver<'a> {
    plant: &'a core::cell::RefCell<Plant>,
}

impl MotorDriver for SimDriver<'_> {
    type Error = Infallible;

    fn set_channel_duty_and_direction(
        &mut self,
        channel: Wheel,
        magnitude: u16,
        forward: bool,
    ) -> Result<(), Infallible> {
        let speed = if forward {
            i32::from(magnitude)
        } else {
            -i32::from(magnitude)
        };
        if channel == Wheel::Left {
            self.plant.borrow_mut().speed = speed as f32;
        }
        COUNTERS.accumulate(channel, (speed / 16) as i16);
        Ok(())
    }
}

struct SimDelay;

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

struct Stdout;

impl fmt::Write for Stdout {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        print!("{}", s);
        Ok(())
    }
}

fn main() {
    let plant = core::cell::RefCell::new(Plant {
        angle: 6.0,
        rate: 0.0,
        speed: 0.0,
    });
    let mut config = BalanceConfig::<f32>::new();
    config.kd = 0.8;

    let mut imu = match Imu::init(SimSensor { plant: &plant }, &mut SimDelay, 50) {
        Ok(imu) => imu,
        Err(error) => {
            println!("sensor init failed: {}", error);
            return;
        }
    };
    let mut driver = SimDriver { plant: &plant };
    let mut protocol: CommandProtocol = CommandProtocol::new();
    let mut uart = Stdout;

    let mut control_loop = ControlLoop::with_config(&config, 0);
    if let Err(error) = control_loop.start(0, &mut imu, &mut uart) {
        println!("start failed: {}", error);
        return;
    }

    let script: [(u32, &[u8]); 3] = [
        (200, b"set kp 18\r"),
        (400, b"get status\r"),
        (600, b"set angle 1.0\r"),
    ];

    for now in 1..=800_u32 {
        plant.borrow_mut().step(0.001);

        for (at, line) in script.iter() {
            if *at == now {
                for &byte in line.iter() {
                    if let Err(error) = protocol.on_byte_received(byte, &mut uart) {
                        println!("serial write failed: {}", error);
                        return;
                    }
                }
            }
        }

        let report = match control_loop.poll(now, &mut imu, &mut driver, &mut protocol, &mut uart)
        {
            Ok(report) => report,
            Err(error) => {
                println!("tick failed: {}", error);
                return;
            }
        };
        if let Some(report) = report {
            if report.command.is_some() {
                println!("    applied {:?}", report.command);
            }
        }
    }

    println!(
        "pending command: {}, encoder left {}, right {}",
        protocol.has_command(),
        COUNTERS.take(Wheel::Left),
        COUNTERS.take(Wheel::Right)
    );
}
